// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subject and body rendering for lifecycle notices.

use std::fmt::Write;

use smelinx_core::{Delivery, NotificationKind};

/// Wrap width for the plain-text alternative.
const TEXT_WIDTH: usize = 78;

/// A rendered notice, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotice {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub fn subject(delivery: &Delivery) -> String {
    let label = match delivery.kind {
        NotificationKind::Deprecate => "Deprecation notice",
        NotificationKind::Sunset => "Sunset notice",
    };
    format!(
        "[Smelinx] {label} – {} {}",
        delivery.api_name, delivery.version_label
    )
}

fn title(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Deprecate => "Deprecation Notice",
        NotificationKind::Sunset => "Sunset Notice",
    }
}

/// Escape text for HTML element and attribute content.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn link_paragraph(out: &mut String, label: &str, url: Option<&str>) {
    let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return;
    };
    let url = escape(url);
    let _ = write!(
        out,
        r#"<p style="margin:8px 0"><b>{label}:</b> <a href="{url}">{url}</a></p>"#
    );
}

pub fn html_body(delivery: &Delivery) -> String {
    let mut out = String::new();
    out.push_str(
        r#"<div style="font-family:ui-sans-serif,system-ui,Segoe UI,Roboto,Arial,sans-serif;line-height:1.5;color:#111">"#,
    );
    let _ = write!(
        out,
        r#"<h2 style="margin:0 0 12px 0">{}</h2>"#,
        title(delivery.kind)
    );
    let _ = write!(
        out,
        r#"<p style="margin:0 0 8px 0"><b>API:</b> {}<br/><b>Version:</b> {}<br/>"#,
        escape(&delivery.api_name),
        escape(&delivery.version_label)
    );
    if let Some(date) = delivery.sunset_date {
        let _ = write!(out, "<b>Sunset date:</b> {}<br/>", date.format("%Y-%m-%d"));
    }
    let _ = write!(
        out,
        "<b>Scheduled at:</b> {}</p>",
        delivery.scheduled_at.to_rfc2822()
    );
    link_paragraph(&mut out, "Base URL", delivery.base_url.as_deref());
    link_paragraph(&mut out, "Docs", delivery.docs_url.as_deref());
    out.push_str(
        r#"<p style="margin-top:16px">If you have questions, please reply to this email.</p>"#,
    );
    out.push_str("</div>");
    out
}

/// Plain-text alternative derived from the HTML body.
pub fn text_body(html: &str) -> String {
    html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .map(|text| text.trim().to_string())
        .unwrap_or_else(|_| html.to_string())
}

pub fn render(delivery: &Delivery) -> RenderedNotice {
    let html = html_body(delivery);
    let text = text_body(&html);
    RenderedNotice {
        subject: subject(delivery),
        html,
        text,
    }
}
