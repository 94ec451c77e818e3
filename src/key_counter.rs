use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Occurrence count per extracted key (endpoint path, user agent, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct KeyCounter {
    counts: HashMap<String, u64>,
}

#[allow(dead_code)]
impl KeyCounter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Increment the count for `key`, inserting it at 1 on first sight
    pub(crate) fn increment(&mut self, key: &str) {
        if let Some(count) = self.counts.get_mut(key) {
            *count += 1;
        } else {
            self.counts.insert(key.to_string(), 1);
        }
    }

    pub(crate) fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys
    pub(crate) fn len(&self) -> usize {
        self.counts.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub(crate) fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(key, &count)| (key.as_str(), count))
    }

    /// Keys by descending count; ties ordered by key
    pub(crate) fn ranked(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self.iter().collect();
        ranked.sort_by_key(|&(key, count)| (Reverse(count), key));
        ranked
    }
}

/// User agent buckets. Declaration order is the matching priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub(crate) enum UserAgentCategory {
    #[serde(rename = "Bots/Crawlers")]
    Bot,
    #[serde(rename = "Web Browsers")]
    Browser,
    #[serde(rename = "Mobile Devices")]
    Mobile,
    #[serde(rename = "API/Tools")]
    Tool,
    #[serde(rename = "Mozilla-based")]
    MozillaBased,
    Other,
}

impl UserAgentCategory {
    pub(crate) const PRIORITY: [UserAgentCategory; 6] = [
        UserAgentCategory::Bot,
        UserAgentCategory::Browser,
        UserAgentCategory::Mobile,
        UserAgentCategory::Tool,
        UserAgentCategory::MozillaBased,
        UserAgentCategory::Other,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            UserAgentCategory::Bot => "Bots/Crawlers",
            UserAgentCategory::Browser => "Web Browsers",
            UserAgentCategory::Mobile => "Mobile Devices",
            UserAgentCategory::Tool => "API/Tools",
            UserAgentCategory::MozillaBased => "Mozilla-based",
            UserAgentCategory::Other => "Other",
        }
    }

    /// Lowercase substrings that place a user agent in this bucket.
    /// `Other` has none and catches everything left over.
    fn tokens(self) -> &'static [&'static str] {
        match self {
            UserAgentCategory::Bot => &["bot", "crawler", "spider", "scraper"],
            UserAgentCategory::Browser => &["chrome", "firefox", "safari", "edge"],
            UserAgentCategory::Mobile => &["mobile", "android", "iphone", "ipad"],
            UserAgentCategory::Tool => &["curl", "wget", "python", "java"],
            UserAgentCategory::MozillaBased => &["mozilla"],
            UserAgentCategory::Other => &[],
        }
    }

    pub(crate) fn categorize(user_agent: &str) -> Self {
        let ua_lower = user_agent.to_lowercase();

        Self::PRIORITY
            .into_iter()
            .find(|category| category.tokens().iter().any(|token| ua_lower.contains(token)))
            .unwrap_or(UserAgentCategory::Other)
    }
}

/// Sum user agent counts per category, highest first
pub(crate) fn categorize_user_agents(user_agents: &KeyCounter) -> Vec<(UserAgentCategory, u64)> {
    let mut totals: HashMap<UserAgentCategory, u64> = HashMap::new();
    for (user_agent, count) in user_agents.iter() {
        *totals.entry(UserAgentCategory::categorize(user_agent)).or_insert(0) += count;
    }

    let mut ranked: Vec<(UserAgentCategory, u64)> = totals.into_iter().collect();
    ranked.sort_by_key(|&(category, count)| (Reverse(count), category));
    ranked
}
