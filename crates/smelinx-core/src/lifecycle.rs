// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Version lifecycle rules.
//!
//! Every transition between `active`, `deprecated` and `sunset` is allowed.
//! The only guard is that a version announcing an end of life carries the
//! date it ends.

use chrono::NaiveDate;

use crate::error::SmelinxError;
use crate::types::VersionStatus;

/// Resolve the sunset date a version will hold after moving to `target`.
///
/// `requested` is the date supplied with the transition and `current` the
/// date already stored (if any). Returning to `active` without a new date
/// keeps the existing one as historical metadata.
pub fn resolve_sunset_date(
    target: VersionStatus,
    requested: Option<NaiveDate>,
    current: Option<NaiveDate>,
) -> Result<Option<NaiveDate>, SmelinxError> {
    if target.requires_sunset_date() {
        return match requested {
            Some(date) => Ok(Some(date)),
            None => Err(SmelinxError::Validation(format!(
                "sunset_date required when status is {target}"
            ))),
        };
    }
    Ok(requested.or(current))
}
