//! Plain-text rendering of the patient page.

use std::fmt::Write as _;

use chrono::DateTime;
use chrono::Utc;
use contact_navigator::PageView;
use contact_navigator::PatientPageModel;
use contact_protocol::Patient;
use contact_protocol::PatientStats;

const DATE_FORMAT: &str = "%d-%m-%Y";

fn date(at: &DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

fn contacted_label(patient: &Patient) -> &'static str {
    if patient.contacted {
        "Contacted"
    } else {
        "Not Contacted"
    }
}

pub fn render_view(view: &PageView) -> String {
    match view {
        PageView::Loading => "Loading...\n".to_string(),
        PageView::NotFound { patient_id } => {
            format!("No patient found for id: \"{patient_id}\"\n")
        }
        PageView::Ready(model) => render_page(model),
    }
}

/// `(2 of 7) | Patient SSN: ... | Contacted patients: 3 | Total patients: 10`
pub fn render_header(model: &PatientPageModel) -> String {
    format!(
        "({} of {}) | Patient SSN: {} | Contacted patients: {} | Total patients: {}",
        model.position,
        model.stats.remaining_patients_count,
        model.patient.ssn,
        model.stats.contacted_patients_count,
        model.stats.total_patients_count,
    )
}

fn render_page(model: &PatientPageModel) -> String {
    let patient = &model.patient;
    let mut out = String::new();

    let _ = writeln!(out, "{}", render_header(model));
    let _ = writeln!(
        out,
        "{}  [t] {}  {}",
        if model.previous_disabled {
            "[-] previous"
        } else {
            "[p] previous"
        },
        model.toggle_label(),
        if model.next_disabled {
            "[-] next"
        } else {
            "[n] next"
        },
    );
    out.push('\n');

    let _ = writeln!(out, "{}", render_details(patient));
    let _ = writeln!(
        out,
        "Current Patient Index (not contacted): {}",
        model.position
    );
    out.push('\n');

    let _ = writeln!(out, "Uncontacted patients");
    for entry in &model.uncontacted_patients {
        let marker = if entry.id == patient.id { '>' } else { ' ' };
        let _ = writeln!(out, "{marker} {}", render_row(entry));
    }
    out
}

pub fn render_details(patient: &Patient) -> String {
    let gender = patient
        .gender
        .as_ref()
        .map(|g| g.name.as_str())
        .unwrap_or("");
    format!(
        "First name: {}\nLast name: {}\nContacted: {}\nGender: {}\nPatient created: {}\nPatient updated: {}",
        patient.first_name,
        patient.last_name,
        if patient.contacted { "Yes" } else { "No" },
        gender,
        date(&patient.created),
        date(&patient.updated),
    )
}

/// One list line: `Ada Lovelace (Not Contacted) [id]`.
pub fn render_row(patient: &Patient) -> String {
    format!(
        "{} ({}) [{}]",
        patient.full_name(),
        contacted_label(patient),
        patient.id
    )
}

pub fn render_stats(stats: &PatientStats) -> String {
    format!(
        "Total patients: {}\nContacted patients: {}\nRemaining patients: {}",
        stats.total_patients_count, stats.contacted_patients_count, stats.remaining_patients_count,
    )
}
