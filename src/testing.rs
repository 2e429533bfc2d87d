use crate::models::{Offer, PlacementStatus, StudentRecord};

pub fn student(id: &str, first: &str, last: &str) -> StudentRecord {
    let mut record = StudentRecord::new(id);
    record.first_name = Some(first.to_string());
    record.last_name = Some(last.to_string());
    record
}

pub fn placed(id: &str, first: &str, last: &str, company: &str, package: f64) -> StudentRecord {
    let mut record = student(id, first, last);
    record.placement_status = PlacementStatus::Placed;
    let offer = Offer {
        company_name: Some(company.to_string()),
        package: Some(package),
        acceptance_date: None,
    };
    record.offers_received.push(offer.clone());
    record.current_offer = Some(offer);
    record
}

pub fn ids(records: &[&StudentRecord]) -> Vec<String> {
    records.iter().map(|r| r.id.0.clone()).collect()
}
