use chrono::NaiveDate;

use super::EmailMessage;

/// Severity framing for deadline alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertFraming {
    Urgent,
    ActionRequired,
}

impl AlertFraming {
    pub const URGENT_THRESHOLD_DAYS: i64 = 3;

    pub fn for_days_remaining(days_remaining: i64) -> Self {
        if days_remaining <= Self::URGENT_THRESHOLD_DAYS {
            AlertFraming::Urgent
        } else {
            AlertFraming::ActionRequired
        }
    }

    pub const fn banner(self) -> &'static str {
        match self {
            AlertFraming::Urgent => "URGENT",
            AlertFraming::ActionRequired => "ACTION REQUIRED",
        }
    }

    const fn accent(self) -> &'static str {
        match self {
            AlertFraming::Urgent => "#b91c1c",
            AlertFraming::ActionRequired => "#b45309",
        }
    }
}

pub struct DeadlineAlert<'a> {
    pub to: &'a str,
    pub trustee_name: &'a str,
    pub trust_name: &'a str,
    pub beneficiary_name: &'a str,
    pub withdrawal_amount: f64,
    pub withdrawal_deadline: NaiveDate,
    pub notice_date: NaiveDate,
    pub days_remaining: i64,
}

pub fn deadline_alert(alert: &DeadlineAlert<'_>) -> EmailMessage {
    let framing = AlertFraming::for_days_remaining(alert.days_remaining);
    let days = day_count(alert.days_remaining);
    let subject = format!(
        "Crummey Notice Deadline Alert - {} - {} Remaining",
        alert.trust_name, days
    );

    let text = format!(
        "{banner}: Crummey withdrawal deadline approaching\n\n\
         Dear {trustee},\n\n\
         The withdrawal window for {beneficiary} under {trust} closes on {deadline} \
         ({days} remaining).\n\
         Withdrawal amount: {amount}\n\
         Notice sent: {notice_date}\n\n\
         If the beneficiary has exercised the withdrawal right, record it before the deadline.",
        banner = framing.banner(),
        trustee = alert.trustee_name,
        beneficiary = alert.beneficiary_name,
        trust = alert.trust_name,
        deadline = alert.withdrawal_deadline,
        days = days,
        amount = currency(alert.withdrawal_amount),
        notice_date = alert.notice_date,
    );

    let html = format!(
        "<div style=\"font-family:sans-serif\">\
         <h2 style=\"color:{accent}\">{banner}: Crummey withdrawal deadline approaching</h2>\
         <p>Dear {trustee},</p>\
         <p>The withdrawal window for <strong>{beneficiary}</strong> under <strong>{trust}</strong> \
         closes on <strong>{deadline}</strong> ({days} remaining).</p>\
         <ul><li>Withdrawal amount: {amount}</li><li>Notice sent: {notice_date}</li></ul>\
         <p>If the beneficiary has exercised the withdrawal right, record it before the deadline.</p>\
         </div>",
        accent = framing.accent(),
        banner = framing.banner(),
        trustee = escape_html(alert.trustee_name),
        beneficiary = escape_html(alert.beneficiary_name),
        trust = escape_html(alert.trust_name),
        deadline = alert.withdrawal_deadline,
        days = days,
        amount = currency(alert.withdrawal_amount),
        notice_date = alert.notice_date,
    );

    EmailMessage {
        to: alert.to.to_string(),
        subject,
        html,
        text,
    }
}

pub struct CrummeyLetter<'a> {
    pub to: &'a str,
    pub beneficiary_name: &'a str,
    pub trust_name: &'a str,
    pub trustee_name: &'a str,
    pub trustee_email: Option<&'a str>,
    pub withdrawal_amount: f64,
    pub notice_date: NaiveDate,
    pub withdrawal_deadline: NaiveDate,
}

pub fn crummey_notice(letter: &CrummeyLetter<'_>) -> EmailMessage {
    let period_days = (letter.withdrawal_deadline - letter.notice_date).num_days();
    let contact = letter.trustee_email.unwrap_or("the trustee");
    let subject = format!("Crummey Notice - {} - Withdrawal Rights", letter.trust_name);

    let text = format!(
        "Dear {beneficiary},\n\n\
         A gift has been made to {trust}. You have the right to withdraw up to {amount} \
         within {period} days of this notice ({notice_date}). The right lapses after {deadline}.\n\n\
         To exercise this right, contact {trustee} at {contact} before the deadline.",
        beneficiary = letter.beneficiary_name,
        trust = letter.trust_name,
        amount = currency(letter.withdrawal_amount),
        period = period_days,
        notice_date = letter.notice_date,
        deadline = letter.withdrawal_deadline,
        trustee = letter.trustee_name,
        contact = contact,
    );

    let html = format!(
        "<div style=\"font-family:sans-serif\">\
         <h2>Notice of Withdrawal Rights</h2>\
         <p>Dear {beneficiary},</p>\
         <p>A gift has been made to <strong>{trust}</strong>. You have the right to withdraw up to \
         <strong>{amount}</strong> within {period} days of this notice ({notice_date}).</p>\
         <p>The right lapses after <strong>{deadline}</strong>. To exercise it, contact {trustee} \
         at {contact} before the deadline.</p>\
         </div>",
        beneficiary = escape_html(letter.beneficiary_name),
        trust = escape_html(letter.trust_name),
        amount = currency(letter.withdrawal_amount),
        period = period_days,
        notice_date = letter.notice_date,
        deadline = letter.withdrawal_deadline,
        trustee = escape_html(letter.trustee_name),
        contact = escape_html(contact),
    );

    EmailMessage {
        to: letter.to.to_string(),
        subject,
        html,
        text,
    }
}

pub struct AlertIssue<'a> {
    pub severity: &'a str,
    pub description: &'a str,
}

pub struct AlertAction<'a> {
    pub title: &'a str,
    pub priority: &'a str,
    pub due_date: NaiveDate,
}

pub struct RemediationAlert<'a> {
    pub to: &'a str,
    pub trustee_name: &'a str,
    pub trust_name: &'a str,
    pub carrier: &'a str,
    pub policy_number: &'a str,
    pub overall_status: &'a str,
    pub health_score: f64,
    pub check_date: NaiveDate,
    pub issues: Vec<AlertIssue<'a>>,
    pub actions: Vec<AlertAction<'a>>,
}

pub fn remediation_alert(alert: &RemediationAlert<'_>) -> EmailMessage {
    let subject = format!(
        "[{}] Policy Health Alert - {}",
        alert.overall_status.to_ascii_uppercase(),
        alert.trust_name
    );

    let mut text = format!(
        "Dear {},\n\n\
         The health check on {} policy {} ({}) completed on {} with status {} \
         and a score of {:.1}.\n\nIssues:\n",
        alert.trustee_name,
        alert.carrier,
        alert.policy_number,
        alert.trust_name,
        alert.check_date,
        alert.overall_status,
        alert.health_score,
    );
    for issue in &alert.issues {
        text.push_str(&format!("- [{}] {}\n", issue.severity, issue.description));
    }
    text.push_str("\nRemediation actions:\n");
    for action in &alert.actions {
        text.push_str(&format!(
            "- {} ({}, due {})\n",
            action.title, action.priority, action.due_date
        ));
    }

    let issue_items: String = alert
        .issues
        .iter()
        .map(|issue| {
            format!(
                "<li><strong>{}</strong>: {}</li>",
                escape_html(issue.severity),
                escape_html(issue.description)
            )
        })
        .collect();
    let action_items: String = alert
        .actions
        .iter()
        .map(|action| {
            format!(
                "<li>{} ({}, due {})</li>",
                escape_html(action.title),
                escape_html(action.priority),
                action.due_date
            )
        })
        .collect();

    let html = format!(
        "<div style=\"font-family:sans-serif\">\
         <h2>Policy Health Alert</h2>\
         <p>Dear {trustee},</p>\
         <p>The health check on {carrier} policy {number} ({trust}) completed on {date} with \
         status <strong>{status}</strong> and a score of {score:.1}.</p>\
         <h3>Issues</h3><ul>{issues}</ul>\
         <h3>Remediation actions</h3><ul>{actions}</ul>\
         </div>",
        trustee = escape_html(alert.trustee_name),
        carrier = escape_html(alert.carrier),
        number = escape_html(alert.policy_number),
        trust = escape_html(alert.trust_name),
        date = alert.check_date,
        status = escape_html(alert.overall_status),
        score = alert.health_score,
        issues = issue_items,
        actions = action_items,
    );

    EmailMessage {
        to: alert.to.to_string(),
        subject,
        html,
        text,
    }
}

pub struct AssignmentNotice<'a> {
    pub to: &'a str,
    pub assignee_name: &'a str,
    pub action_type: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub priority: &'a str,
    pub due_date: NaiveDate,
}

pub fn assignment(notice: &AssignmentNotice<'_>) -> EmailMessage {
    let subject = format!("TrustFlow360: Action Assigned - {}", notice.action_type);
    let text = format!(
        "Hello {},\n\nYou have been assigned: {}\nPriority: {}\nDue: {}\n\n{}",
        notice.assignee_name, notice.title, notice.priority, notice.due_date, notice.description
    );
    let html = format!(
        "<div style=\"font-family:sans-serif\"><p>Hello {},</p>\
         <p>You have been assigned: <strong>{}</strong></p>\
         <ul><li>Priority: {}</li><li>Due: {}</li></ul><p>{}</p></div>",
        escape_html(notice.assignee_name),
        escape_html(notice.title),
        escape_html(notice.priority),
        notice.due_date,
        escape_html(notice.description),
    );

    EmailMessage {
        to: notice.to.to_string(),
        subject,
        html,
        text,
    }
}

fn day_count(days: i64) -> String {
    if days == 1 {
        "1 Day".to_string()
    } else {
        format!("{days} Days")
    }
}

pub fn currency(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let (sign, cents) = if cents < 0 { ("-", -cents) } else { ("", cents) };
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{:02}", cents % 100)
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
