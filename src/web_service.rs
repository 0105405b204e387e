//! Endpoints of the SDK backend.
use serde_json::{json, Value};

use crate::{Endpoint, HttpMethod, Parameters};

/// SDK backend calls.
///
/// Payloads are JSON objects built by the caller. Variants carrying an `Option` send no body
/// when it is `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum WebService {
    /// App configuration.
    Configuration,
    /// Register the device.
    PostDevice(Option<Parameters>),
    /// Push notification settings, sent as `{"push": settings}`.
    PatchDevice {
        /// Settings object, `None` sends no body.
        push_settings: Option<Parameters>,
    },
    /// Localized texts.
    Texts {
        /// Sent as the `locale` query parameter.
        locale: String,
    },
    /// A push notification event, sent as `{"pushes": [event]}`.
    PostPushStatistic(Option<Parameters>),
    /// Usage statistics.
    PostStats(Option<Parameters>),
    /// Dialog to show at launch, if any.
    Dialog,
    /// Rating prompt configuration.
    RatingsConfiguration {
        /// Sent as the `campaign_id` query parameter when set.
        campaign_id: Option<i64>,
    },
    /// Submit a rating.
    PostRating,
    /// Feedback form configuration.
    FeedbackConfiguration,
    /// Submit feedback.
    PostFeedback,
    /// Backend version.
    Version,
}

impl Endpoint for WebService {
    fn path(&self) -> &str {
        match self {
            WebService::Configuration => "sdk/configuration",
            WebService::PostDevice(_) | WebService::PatchDevice { .. } => "sdk/devices",
            WebService::Texts { .. } => "sdk/texts",
            WebService::PostPushStatistic(_) | WebService::PostStats(_) => "sdk/statistics",
            WebService::Dialog => "sdk/dialog",
            WebService::RatingsConfiguration { .. } | WebService::PostRating => "sdk/rating",
            WebService::FeedbackConfiguration | WebService::PostFeedback => "sdk/feedback",
            WebService::Version => "sdk/version",
        }
    }

    fn http_method(&self) -> HttpMethod {
        match self {
            WebService::Configuration
            | WebService::Texts { .. }
            | WebService::Dialog
            | WebService::RatingsConfiguration { .. }
            | WebService::FeedbackConfiguration
            | WebService::Version => HttpMethod::Get,
            WebService::PostDevice(_)
            | WebService::PostPushStatistic(_)
            | WebService::PostStats(_)
            | WebService::PostRating
            | WebService::PostFeedback => HttpMethod::Post,
            WebService::PatchDevice { .. } => HttpMethod::Patch,
        }
    }

    fn parameters(&self) -> Option<Parameters> {
        match self {
            WebService::Texts { locale } => object(json!({ "locale": locale })),
            WebService::RatingsConfiguration {
                campaign_id: Some(campaign_id),
            } => object(json!({ "campaign_id": campaign_id })),
            _ => None,
        }
    }

    fn body(&self) -> Option<Parameters> {
        match self {
            WebService::PostDevice(device) => device.clone(),
            WebService::PatchDevice { push_settings } => push_settings
                .as_ref()
                .and_then(|settings| object(json!({ "push": settings }))),
            WebService::PostPushStatistic(event) => event
                .as_ref()
                .and_then(|event| object(json!({ "pushes": [event] }))),
            WebService::PostStats(stats) => stats.clone(),
            _ => None,
        }
    }
}

fn object(value: Value) -> Option<Parameters> {
    match value {
        Value::Object(object) => Some(object),
        _ => None,
    }
}
