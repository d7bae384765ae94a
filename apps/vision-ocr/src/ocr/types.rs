//! Vision OCR wire types
//!
//! Request and reply bodies of the `recognizeText` call.

use serde::{Deserialize, Deserializer, Serialize};

/// MIME type of the encoded region image
pub const IMAGE_MIME_TYPE: &str = "image/png";

/// Request body.
///
/// The MIME type key carries a trailing colon; the deployed service is sent
/// exactly this key.
#[derive(Debug, Clone, Serialize)]
pub struct RecognizeRequest {
    /// Base64 encoded PNG
    pub content: String,
    #[serde(rename = "languageCodes")]
    pub language_codes: Vec<String>,
    #[serde(rename = "mimeType:")]
    pub mime_type: &'static str,
}

/// Reply body: either a result or an error
#[derive(Debug, Clone, Deserialize)]
pub struct RecognizeResponse {
    #[serde(default)]
    pub result: Option<RecognizeResult>,
    #[serde(default)]
    pub error: Option<ServiceError>,
    /// gRPC-gateway style errors put the message at the top level
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeResult {
    pub text_annotation: TextAnnotation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceError {
    #[serde(default)]
    pub message: String,
}

/// Recognized text of one image
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextAnnotation {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// Structural text unit: lines plus a bounding polygon in image pixels
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default)]
    pub bounding_box: Polygon,
    #[serde(default)]
    pub lines: Vec<Line>,
}

impl Block {
    /// Lines joined with newlines
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Line {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Polygon {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

/// Polygon corner in image pixels.
///
/// The service encodes int64 values as strings and omits zero coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Vertex {
    #[serde(default, deserialize_with = "deserialize_coord")]
    pub x: i64,
    #[serde(default, deserialize_with = "deserialize_coord")]
    pub y: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoord {
    Int(i64),
    Float(f64),
    Str(String),
}

fn deserialize_coord<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawCoord::deserialize(deserializer)? {
        RawCoord::Int(v) => Ok(v),
        RawCoord::Float(v) => Ok(v.trunc() as i64),
        RawCoord::Str(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|v| v.trunc() as i64))
                .map_err(|_| serde::de::Error::custom(format!("invalid coordinate: {:?}", s)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_keeps_mime_type_key() {
        let request = RecognizeRequest {
            content: "aGk=".to_string(),
            language_codes: vec!["*".to_string()],
            mime_type: IMAGE_MIME_TYPE,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["mimeType:"], "image/png");
        assert_eq!(json["languageCodes"][0], "*");
        assert_eq!(json["content"], "aGk=");
        assert!(json.get("mimeType").is_none());
    }

    #[test]
    fn test_parse_result() {
        let json = r#"{
            "result": {
                "textAnnotation": {
                    "width": "300",
                    "height": "150",
                    "blocks": [{
                        "boundingBox": {"vertices": [
                            {"x": "0", "y": "0"}, {"x": "0", "y": "15"},
                            {"x": "30", "y": "15"}, {"x": "30", "y": "0"}
                        ]},
                        "lines": [{"text": "Hello"}, {"text": "World"}]
                    }]
                }
            }
        }"#;
        let response: RecognizeResponse = serde_json::from_str(json).unwrap();
        let annotation = response.result.unwrap().text_annotation;
        assert_eq!(annotation.blocks.len(), 1);
        assert_eq!(annotation.blocks[0].text(), "Hello\nWorld");
        assert_eq!(annotation.blocks[0].bounding_box.vertices[2], Vertex { x: 30, y: 15 });
    }

    #[test]
    fn test_parse_error() {
        let json = r#"{"error": {"message": "Unauthenticated"}}"#;
        let response: RecognizeResponse = serde_json::from_str(json).unwrap();
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().message, "Unauthenticated");
    }

    #[test]
    fn test_vertex_omitted_and_numeric_coords() {
        let json = r#"{"vertices": [{"y": "15"}, {"x": 30.9, "y": 15}]}"#;
        let polygon: Polygon = serde_json::from_str(json).unwrap();
        assert_eq!(polygon.vertices[0], Vertex { x: 0, y: 15 });
        assert_eq!(polygon.vertices[1], Vertex { x: 30, y: 15 });
    }

    #[test]
    fn test_vertex_rejects_garbage() {
        let result: Result<Vertex, _> = serde_json::from_str(r#"{"x": "abc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_blocks() {
        let annotation: TextAnnotation = serde_json::from_str("{}").unwrap();
        assert!(annotation.blocks.is_empty());
    }
}
