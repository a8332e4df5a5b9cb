use serde::{Deserialize, Deserializer, Serialize};

/// Stored in `home_url` when the research stage could not resolve a website.
pub const NOT_FOUND: &str = "Not found";

/// Stored in `description` when the research stage could not describe the company.
pub const NOT_AVAILABLE: &str = "Not available";

/// Deserialize `null` as `T::default()`.
///
/// Models often answer `"competitors": null` or `"free_tier": null` for facts
/// they could not find; the remaining keys must still be kept.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Shared record threaded through every stage of one pipeline run.
///
/// Each stage owns a disjoint set of fields and reports changes as a
/// [`StateUpdate`]; the pipeline merges updates in stage order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub company_name: String,
    pub home_url: String,
    pub description: String,
    pub competitors: Vec<String>,
    pub pricing_info: Vec<PricingRecord>,
    pub news_headlines: Vec<Headline>,
    pub loop_count: u32,
    pub final_report: String,
}

impl PipelineState {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            ..Self::default()
        }
    }

    /// The company website, or `None` while it is empty or the [`NOT_FOUND`] sentinel.
    ///
    /// ```
    /// use battle_card::PipelineState;
    ///
    /// let mut state = PipelineState::new("Acme");
    /// assert_eq!(state.resolved_home_url(), None);
    /// state.home_url = "Not found".into();
    /// assert_eq!(state.resolved_home_url(), None);
    /// state.home_url = "https://acme.test".into();
    /// assert_eq!(state.resolved_home_url(), Some("https://acme.test"));
    /// ```
    pub fn resolved_home_url(&self) -> Option<&str> {
        let url = self.home_url.trim();
        if url.is_empty() || url == NOT_FOUND {
            None
        } else {
            Some(url)
        }
    }

    /// The first extracted pricing record, if any.
    pub fn pricing(&self) -> Option<&PricingRecord> {
        self.pricing_info.first()
    }

    /// Merge a stage's update into this state.
    pub fn apply(&mut self, update: StateUpdate) {
        update.apply(self);
    }
}

/// Pricing facts extracted from a company's pricing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingRecord {
    #[serde(default, deserialize_with = "null_default")]
    pub free_tier: bool,
    #[serde(default)]
    pub starter_plan: Option<StarterPlan>,
    #[serde(default, deserialize_with = "null_default")]
    pub enterprise_plan: bool,
}

/// Cheapest paid plan after the free tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StarterPlan {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
}

impl StarterPlan {
    /// `"name: price"` when both are known and non-empty.
    pub fn label(&self) -> Option<String> {
        match (self.name.as_deref(), self.price.as_deref()) {
            (Some(name), Some(price)) if !name.trim().is_empty() && !price.trim().is_empty() => {
                Some(format!("{}: {}", name, price))
            }
            _ => None,
        }
    }
}

/// A news or blog headline with its 1-based position on the page.
///
/// A missing or null `position` deserializes as `0`; the news stage
/// renumbers those by list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub position: u32,
}

/// Fields a stage changed. `None` leaves the state's field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub home_url: Option<String>,
    pub description: Option<String>,
    pub competitors: Option<Vec<String>>,
    pub pricing_info: Option<Vec<PricingRecord>>,
    pub news_headlines: Option<Vec<Headline>>,
    pub final_report: Option<String>,
    pub loop_count: Option<u32>,
}

impl StateUpdate {
    /// An update that only records one more executed stage.
    pub fn advance(state: &PipelineState) -> Self {
        Self {
            loop_count: Some(state.loop_count + 1),
            ..Self::default()
        }
    }

    pub fn apply(self, state: &mut PipelineState) {
        if let Some(v) = self.home_url {
            state.home_url = v;
        }
        if let Some(v) = self.description {
            state.description = v;
        }
        if let Some(v) = self.competitors {
            state.competitors = v;
        }
        if let Some(v) = self.pricing_info {
            state.pricing_info = v;
        }
        if let Some(v) = self.news_headlines {
            state.news_headlines = v;
        }
        if let Some(v) = self.final_report {
            state.final_report = v;
        }
        if let Some(v) = self.loop_count {
            state.loop_count = state.loop_count.max(v);
        }
    }
}

/// Result of one stage run. Stages never fail outright.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// The stage did what it set out to do.
    Ok(StateUpdate),
    /// The stage fell back to its defaults; `reason` says why.
    Degraded { update: StateUpdate, reason: String },
}

impl StageOutcome {
    pub fn degraded(update: StateUpdate, reason: impl Into<String>) -> Self {
        Self::Degraded {
            update,
            reason: reason.into(),
        }
    }

    pub fn update(&self) -> &StateUpdate {
        match self {
            Self::Ok(update) | Self::Degraded { update, .. } => update,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn into_update(self) -> StateUpdate {
        match self {
            Self::Ok(update) | Self::Degraded { update, .. } => update,
        }
    }
}

/// Progress update emitted during pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineProgress {
    /// Current stage index (0-based).
    pub stage_index: usize,

    /// Total number of stages in the pipeline.
    pub total_stages: usize,

    /// Name of the current stage.
    pub stage_name: String,
}
