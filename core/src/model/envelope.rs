use serde::{Deserialize, Serialize};

/// `{ "data": [...] }` wrapper used by every backend listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Envelope<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data }
    }

    pub fn into_inner(self) -> Vec<T> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PositionRecord;

    #[test]
    fn envelope_decodes_position_batch() {
        let body = r#"{"data":[{"id":7,"deviceId":1,"fixTime":"2015-06-01T10:00:00Z",
            "longitude":10.0,"latitude":20.0,"course":90.0}]}"#;
        let batch: Envelope<PositionRecord> = serde_json::from_str(body).unwrap();
        let records = batch.into_inner();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device_id, 1);
        assert_eq!(records[0].course, 90.0);
    }

    #[test]
    fn envelope_without_data_is_empty() {
        let batch: Envelope<PositionRecord> = serde_json::from_str("{}").unwrap();
        assert!(batch.data.is_empty());
    }
}
