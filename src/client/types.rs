//! Wire types for the analysis service.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64-encoded JPEG.
    pub image: String,
}

impl AnalyzeRequest {
    /// Wraps base64 JPEG text.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` when the service is up.
    pub status: String,
    /// Human-readable status.
    pub message: String,
    /// Whether detection and inference models are ready.
    pub models_loaded: bool,
}

/// One detected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceResult {
    /// Estimated age in years.
    pub age: i64,
    /// Predicted gender label.
    pub gender: String,
    /// Detection confidence.
    pub confidence: f64,
}

/// A response field parsed on its own.
///
/// One bad field must never prevent the rest of the response from being
/// used, so each field carries its own outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    /// Parsed successfully.
    Present(T),
    /// Absent or `null`.
    Missing,
    /// Present but not of the expected shape.
    Malformed(String),
}

impl<T> Field<T> {
    /// The value, if parsed.
    pub fn present(&self) -> Option<&T> {
        match self {
            Field::Present(value) => Some(value),
            _ => None,
        }
    }

    /// True if the value parsed.
    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }

    fn extract(object: &Map<String, Value>, key: &str) -> Self
    where
        T: DeserializeOwned,
    {
        match object.get(key) {
            None | Some(Value::Null) => Field::Missing,
            Some(value) => match T::deserialize(value) {
                Ok(parsed) => Field::Present(parsed),
                Err(e) => Field::Malformed(e.to_string()),
            },
        }
    }
}

/// Body of `POST /analyze`, parsed leniently field by field.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeResponse {
    /// `"success"` on a completed analysis.
    pub status: Field<String>,
    /// Human-readable outcome.
    pub message: Field<String>,
    /// Number of faces detected.
    pub faces_count: Field<u32>,
    /// Base64-encoded annotated JPEG.
    pub processed_image: Field<String>,
    /// Faces in server order.
    pub faces: Field<Vec<FaceResult>>,
}

impl AnalyzeResponse {
    /// Parses a response body.
    ///
    /// A body that is not a JSON object yields every field `Malformed`.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            let reason = format!("expected a JSON object, got {}", kind_of(value));
            return Self {
                status: Field::Malformed(reason.clone()),
                message: Field::Malformed(reason.clone()),
                faces_count: Field::Malformed(reason.clone()),
                processed_image: Field::Malformed(reason.clone()),
                faces: Field::Malformed(reason),
            };
        };

        Self {
            status: Field::extract(object, "status"),
            message: Field::extract(object, "message"),
            faces_count: Field::extract(object, "faces_count"),
            processed_image: Field::extract(object, "processed_image"),
            faces: Field::extract(object, "faces"),
        }
    }

    /// Required fields that are missing or malformed, with the reason.
    pub fn required_field_problems(&self) -> Vec<(&'static str, String)> {
        let mut problems = Vec::new();
        push_problem(&mut problems, "status", &self.status);
        push_problem(&mut problems, "message", &self.message);
        push_problem(&mut problems, "faces_count", &self.faces_count);
        problems
    }
}

fn push_problem<T>(out: &mut Vec<(&'static str, String)>, name: &'static str, field: &Field<T>) {
    match field {
        Field::Present(_) => {}
        Field::Missing => out.push((name, "missing".to_string())),
        Field::Malformed(reason) => out.push((name, reason.clone())),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_response() {
        let response = AnalyzeResponse::from_value(&json!({
            "status": "success",
            "message": "Image processed successfully",
            "faces_count": 2,
            "faces": [
                {"age": 25, "gender": "Male", "confidence": 0.93},
                {"age": 31, "gender": "Female", "confidence": 0.88}
            ],
            "processed_image": "abcd"
        }));

        assert_eq!(response.status, Field::Present("success".to_string()));
        assert_eq!(response.faces_count, Field::Present(2));
        assert_eq!(response.processed_image.present().unwrap(), "abcd");
        let faces = response.faces.present().unwrap();
        assert_eq!(faces[0].age, 25);
        assert_eq!(faces[1].gender, "Female");
        assert!(response.required_field_problems().is_empty());
    }

    #[test]
    fn test_optional_fields_missing() {
        let response = AnalyzeResponse::from_value(&json!({
            "status": "success",
            "message": "ok",
            "faces_count": 0
        }));

        assert_eq!(response.processed_image, Field::Missing);
        assert_eq!(response.faces, Field::Missing);
        assert!(response.required_field_problems().is_empty());
    }

    #[test]
    fn test_bad_field_does_not_spoil_others() {
        let response = AnalyzeResponse::from_value(&json!({
            "status": 7,
            "faces_count": "two",
            "faces": [{"age": 40, "gender": "Male", "confidence": 0.5}],
            "processed_image": "abcd"
        }));

        assert!(matches!(response.status, Field::Malformed(_)));
        assert_eq!(response.message, Field::Missing);
        assert!(matches!(response.faces_count, Field::Malformed(_)));
        assert!(response.faces.is_present());
        assert!(response.processed_image.is_present());

        let problems = response.required_field_problems();
        let names: Vec<_> = problems.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["status", "message", "faces_count"]);
    }

    #[test]
    fn test_malformed_face_entry() {
        let response = AnalyzeResponse::from_value(&json!({
            "faces": [{"age": "old", "gender": "Male", "confidence": 0.5}]
        }));
        assert!(matches!(response.faces, Field::Malformed(_)));
    }

    #[test]
    fn test_non_object_body() {
        let response = AnalyzeResponse::from_value(&json!([1, 2, 3]));
        assert!(matches!(response.status, Field::Malformed(ref r) if r.contains("an array")));
        assert!(matches!(response.faces, Field::Malformed(_)));
    }

    #[test]
    fn test_health_response_parses() {
        let health: HealthResponse = serde_json::from_value(json!({
            "status": "ok",
            "message": "Server is running",
            "models_loaded": false
        }))
        .unwrap();
        assert!(!health.models_loaded);
    }

    #[test]
    fn test_request_serializes() {
        let body = serde_json::to_value(AnalyzeRequest::new("QUJD")).unwrap();
        assert_eq!(body, json!({"image": "QUJD"}));
    }
}
