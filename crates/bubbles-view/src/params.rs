//! Launch parameters carried in the page URL.

use bubbles_types::TopicId;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::ViewError;

/// Topic to open once its entry animation ends, and whether to expand it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchParams {
    /// 1-based topic number
    pub topic_num: Option<usize>,
    pub expand: bool,
}

impl LaunchParams {
    /// Read `topicNum` and `expand=1` from the query string of `url`.
    ///
    /// A missing, zero or non-numeric `topicNum` leaves the launch topic unset.
    pub fn from_url(url: &str) -> Result<Self, ViewError> {
        let url = Url::parse(url).map_err(|e| ViewError::InvalidUrl(e.to_string()))?;
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "topicNum" => {
                    params.topic_num = value.trim().parse().ok().filter(|&n: &usize| n > 0)
                }
                "expand" => params.expand = value == "1",
                _ => {}
            }
        }
        Ok(params)
    }

    pub fn new(topic_num: Option<usize>, expand: bool) -> Self {
        Self { topic_num, expand }
    }

    /// Zero-based launch topic.
    pub fn topic(&self) -> Option<TopicId> {
        self.topic_num.map(|n| n - 1)
    }
}
