use chrono::{DateTime, Utc};
use graphx_types::Plan;
use rust_decimal::Decimal;
use url::Url;

const BRAND_NAME: &str = "Graph-X";

fn origin_label(app_origin: &str) -> String {
    Url::parse(app_origin)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()))
        .unwrap_or_else(|| app_origin.to_string())
}

/// Minor units rendered as rupees with two decimals, e.g. `79900` -> `₹799.00`.
pub fn format_inr(amount_minor: i64) -> String {
    format!("₹{:.2}", Decimal::new(amount_minor, 2))
}

/// Long date, e.g. `5 March 2026`.
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%-d %B %Y").to_string()
}

fn detail_box(title: &str, rows: &[(&str, String)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(label, value)| {
            format!(r#"<p style="margin:4px 0;color:#374151;"><strong>{label}:</strong> {value}</p>"#)
        })
        .collect();
    format!(
        r#"<div style="background:#f5f5f5;padding:15px;border-radius:8px;margin:16px 0;"><h3 style="margin:0 0 8px;font-size:16px;color:#111827;">{title}</h3>{rows}</div>"#
    )
}

pub fn login_notification_email(app_origin: &str, name: &str) -> (String, String) {
    let subject = format!("Successful Login to {BRAND_NAME}");
    let headline = format!("Hello {name}!");
    let lead = format!("You have successfully logged in to your {BRAND_NAME} account.");
    let body = "<p style=\"margin:12px 0 0;color:#374151;\">If this wasn't you, please secure your account immediately.</p>";
    let reason = format!("someone signed in to your {BRAND_NAME} account");

    let html = wrap_email(app_origin, &headline, &lead, body, &reason, None);
    (subject, html)
}

pub struct PaymentConfirmation<'a> {
    pub name: &'a str,
    pub plan: Plan,
    pub amount_minor: i64,
    pub expires_at: DateTime<Utc>,
    pub payment_id: &'a str,
}

pub fn payment_confirmation_email(
    app_origin: &str,
    details: &PaymentConfirmation<'_>,
) -> (String, String) {
    let plan = details.plan.label();
    let amount = format_inr(details.amount_minor);
    let subject = format!("Payment Confirmation for {BRAND_NAME} {plan} Plan");
    let headline = "Payment Successful!";
    let lead = format!(
        "Hello {}, thank you for subscribing to the {BRAND_NAME} <strong>{plan}</strong> plan. Your payment of <strong>{amount}</strong> has been processed.",
        details.name
    );
    let body = detail_box(
        "Subscription Details",
        &[
            ("Plan", plan.to_string()),
            ("Amount Paid", amount.clone()),
            ("Subscription Active Until", format_date(details.expires_at)),
            ("Payment Method", "Razorpay".to_string()),
        ],
    );
    let reason = format!("you purchased a {BRAND_NAME} subscription");
    let footer = format!("Payment ID: {}", details.payment_id);

    let html = wrap_email(app_origin, headline, &lead, &body, &reason, Some(&footer));
    (subject, html)
}

pub struct PlanSwitch<'a> {
    pub name: &'a str,
    pub previous_plan: Option<Plan>,
    pub new_plan: Plan,
    pub amount_minor: i64,
    pub expires_at: DateTime<Utc>,
    pub payment_id: Option<&'a str>,
}

pub fn plan_switch_email(app_origin: &str, details: &PlanSwitch<'_>) -> (String, String) {
    let new_plan = details.new_plan.label();
    let previous = details.previous_plan.map(|p| p.label()).unwrap_or("Free");
    let subject = format!("Plan Changed to {BRAND_NAME} {new_plan}");
    let headline = "Plan Change Confirmation";
    let lead = format!(
        "Hello {}, your {BRAND_NAME} subscription has been changed from <strong>{previous}</strong> to <strong>{new_plan}</strong>.",
        details.name
    );

    let mut body = String::new();
    if details.amount_minor > 0 {
        body.push_str(&detail_box(
            "Payment Details",
            &[
                ("Amount Paid", format_inr(details.amount_minor)),
                ("Payment ID", details.payment_id.unwrap_or("-").to_string()),
            ],
        ));
    }
    body.push_str(&detail_box(
        "New Subscription Details",
        &[
            ("Plan", new_plan.to_string()),
            ("Active Until", format_date(details.expires_at)),
        ],
    ));
    let reason = format!("your {BRAND_NAME} plan changed");

    let html = wrap_email(app_origin, headline, &lead, &body, &reason, None);
    (subject, html)
}

pub fn wrap_email(
    app_origin: &str,
    headline: &str,
    lead: &str,
    body_html: &str,
    reason: &str,
    footer_note: Option<&str>,
) -> String {
    let origin = origin_label(app_origin);
    let footer_note = footer_note
        .map(|note| {
            format!(r#"<p style="margin:8px 0 0;color:#4b5563;font-size:13px;">{note}</p>"#)
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <body style="background:#f8fafc;margin:0;padding:24px;font-family:Arial,Helvetica,sans-serif;">
    <div style="max-width:600px;margin:0 auto;background:#ffffff;border:1px solid #e5e7eb;border-radius:12px;padding:24px;">
      <div style="font-size:12px;letter-spacing:0.08em;text-transform:uppercase;color:#4a6baf;">{brand} - {origin}</div>
      <h1 style="margin:12px 0 8px;font-size:22px;color:#111827;">{headline}</h1>
      <p style="margin:0 0 12px;font-size:15px;color:#111827;line-height:1.6;">{lead}</p>
      {body_html}
      <div style="margin-top:20px;padding-top:16px;border-top:1px solid #e5e7eb;">
        <p style="margin:0 0 6px;font-size:13px;color:#4b5563;">Why you got this email: {reason}.</p>
        <p style="margin:0;font-size:13px;color:#4b5563;">This is an automated message, please do not reply directly.</p>
        {footer_note}
      </div>
      <p style="margin:14px 0 0;font-size:12px;color:#9ca3af;">The {brand} Team</p>
    </div>
  </body>
</html>
"#,
        brand = BRAND_NAME,
    )
}
