//! Configuration for the Vision OCR adapter

use std::env;
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::Quota;
use serde::{Deserialize, Serialize};

use crate::error::{OcrError, Result};

/// Yandex Cloud Vision synchronous text recognition endpoint
pub const DEFAULT_ENDPOINT: &str = "https://ocr.api.cloud.yandex.net/ocr/v1/recognizeText";

/// Recognition model selector sent in the `model` header
pub const DEFAULT_MODEL: &str = "page";

/// Outbound call quota: at most `requests` calls per `period_ms` window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub requests: u32,
    pub period_ms: u64,
}

impl RateLimitPolicy {
    pub fn new(requests: u32, period: Duration) -> Self {
        Self {
            requests,
            period_ms: period.as_millis() as u64,
        }
    }

    pub fn per_second(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(1))
    }

    /// Token bucket quota: one token replenished every `period / requests`,
    /// bucket size `requests`
    pub fn quota(&self) -> Result<Quota> {
        let requests = NonZeroU32::new(self.requests)
            .ok_or_else(|| OcrError::Config("rate limit requests must be non-zero".to_string()))?;
        let replenish = Duration::from_millis(self.period_ms) / requests.get();
        let quota = Quota::with_period(replenish).ok_or_else(|| {
            OcrError::Config(format!(
                "rate limit window of {}ms is too short for {} requests",
                self.period_ms, self.requests
            ))
        })?;
        Ok(quota.allow_burst(requests))
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::per_second(1)
    }
}

/// Options for the Vision OCR model
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct VisionOcrOptions {
    /// IAM token sent as a bearer credential
    pub iam_token: String,
    /// Folder the token is scoped to (`x-folder-id`)
    pub folder_id: String,
    /// Language hints, `*` lets the service detect
    pub lang: Vec<String>,
    pub endpoint: String,
    pub model: String,
    /// Value of the `x-data-logging-enabled` header
    pub data_logging: bool,
    pub rate_limit: RateLimitPolicy,
    /// Per-request HTTP timeout
    pub timeout_secs: u64,
    /// OCR the whole page and replace existing cells with the result
    pub force_full_page_ocr: bool,
    /// Minimum fraction of the page covered by bitmaps before OCR kicks in
    pub bitmap_area_threshold: f64,
}

impl Default for VisionOcrOptions {
    fn default() -> Self {
        Self {
            iam_token: String::new(),
            folder_id: String::new(),
            lang: vec!["*".to_string()],
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            data_logging: true,
            rate_limit: RateLimitPolicy::default(),
            timeout_secs: 60,
            force_full_page_ocr: false,
            bitmap_area_threshold: 0.05,
        }
    }
}

impl fmt::Debug for VisionOcrOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionOcrOptions")
            .field("iam_token", &"<redacted>")
            .field("folder_id", &self.folder_id)
            .field("lang", &self.lang)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("data_logging", &self.data_logging)
            .field("rate_limit", &self.rate_limit)
            .field("timeout_secs", &self.timeout_secs)
            .field("force_full_page_ocr", &self.force_full_page_ocr)
            .field("bitmap_area_threshold", &self.bitmap_area_threshold)
            .finish()
    }
}

impl VisionOcrOptions {
    pub fn new(iam_token: &str, folder_id: &str) -> Self {
        Self {
            iam_token: iam_token.to_string(),
            folder_id: folder_id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_lang<I, S>(mut self, lang: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lang = lang.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load options from the environment.
    ///
    /// `VISION_OCR_IAM_TOKEN` and `VISION_OCR_FOLDER_ID` are required, every
    /// other variable falls back to the default.
    pub fn from_env() -> std::result::Result<Self, env::VarError> {
        let defaults = Self::default();

        Ok(Self {
            iam_token: env::var("VISION_OCR_IAM_TOKEN")?,
            folder_id: env::var("VISION_OCR_FOLDER_ID")?,
            lang: env::var("VISION_OCR_LANG")
                .map(|v| parse_lang_list(&v))
                .unwrap_or(defaults.lang),
            endpoint: env::var("VISION_OCR_ENDPOINT").unwrap_or(defaults.endpoint),
            model: env::var("VISION_OCR_MODEL").unwrap_or(defaults.model),
            data_logging: env::var("VISION_OCR_DATA_LOGGING")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.data_logging),
            rate_limit: RateLimitPolicy {
                requests: env::var("VISION_OCR_RATE_REQUESTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.rate_limit.requests),
                period_ms: env::var("VISION_OCR_RATE_PERIOD_SECS")
                    .ok()
                    .and_then(|v| v.parse::<f64>().ok())
                    .map(|secs| (secs * 1000.0) as u64)
                    .unwrap_or(defaults.rate_limit.period_ms),
            },
            timeout_secs: env::var("VISION_OCR_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            force_full_page_ocr: env::var("VISION_OCR_FORCE_FULL_PAGE")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.force_full_page_ocr),
            bitmap_area_threshold: env::var("VISION_OCR_BITMAP_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bitmap_area_threshold),
        })
    }
}

fn parse_lang_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
