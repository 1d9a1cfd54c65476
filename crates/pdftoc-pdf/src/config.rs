use pdftoc_core::ValidationLimits;
use thiserror::Error;

/// How a list-valued override interacts with the built-in default list.
#[derive(Debug, Clone)]
pub enum ListOverride<T> {
    /// Use the built-in defaults untouched.
    Default,
    /// Replace the defaults entirely.
    Replace(Vec<T>),
    /// Keep the defaults and add these.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(items) => items.clone(),
            ListOverride::Extend(items) => {
                let mut resolved = defaults.to_vec();
                resolved.extend(items.iter().cloned());
                resolved
            }
        }
    }
}

/// Titles that PDF producers stamp into documents nobody actually named.
/// Compared case-insensitively against the whole candidate.
const DEFAULT_BOILERPLATE_TITLES: &[&str] = &[
    "untitled",
    "untitled document",
    "document",
    "title",
    "draft",
    "confidential",
    "powerpoint presentation",
    "slide 1",
    "full page photo",
];

#[derive(Error, Debug)]
#[error("invalid extraction config: {0}")]
pub struct InvalidConfig(String);

/// Tunables for title and outline extraction.
///
/// Fields are grouped by the module that consumes them.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    // ── title.rs ──
    pub(crate) title_min_length: usize,
    pub(crate) title_max_length: usize,
    /// Fraction of the page height at the top treated as a running header.
    pub(crate) header_band_ratio: f32,
    /// Fraction of the page height at the bottom treated as a running footer.
    pub(crate) footer_band_ratio: f32,
    pub(crate) boilerplate_titles: Vec<String>,

    // ── outline.rs ──
    pub(crate) outline_text_min_length: usize,
    pub(crate) outline_text_max_length: usize,
    pub(crate) max_pages_for_analysis: usize,
    pub(crate) max_outline_items: usize,
    /// A span this many times larger than the page's modal font size is
    /// considered a heading candidate.
    pub(crate) size_outlier_factor: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            title_min_length: 3,
            title_max_length: 500,
            header_band_ratio: 0.04,
            footer_band_ratio: 0.05,
            boilerplate_titles: DEFAULT_BOILERPLATE_TITLES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            outline_text_min_length: 2,
            outline_text_max_length: 1000,
            max_pages_for_analysis: 50,
            max_outline_items: 100,
            size_outlier_factor: 1.2,
        }
    }
}

impl ExtractionConfig {
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder::default()
    }

    /// The ceilings the validator enforces on the final record.
    pub fn validation_limits(&self) -> ValidationLimits {
        ValidationLimits {
            title_max_length: self.title_max_length,
            outline_text_max_length: self.outline_text_max_length,
        }
    }
}

/// Builder for [`ExtractionConfig`]. `build` rejects combinations that
/// would make extraction degenerate instead of clamping them.
#[derive(Debug, Clone)]
pub struct ExtractionConfigBuilder {
    title_min_length: usize,
    title_max_length: usize,
    header_band_ratio: f32,
    footer_band_ratio: f32,
    boilerplate_titles: ListOverride<String>,
    outline_text_min_length: usize,
    outline_text_max_length: usize,
    max_pages_for_analysis: usize,
    max_outline_items: usize,
    size_outlier_factor: f32,
}

impl Default for ExtractionConfigBuilder {
    fn default() -> Self {
        let defaults = ExtractionConfig::default();
        ExtractionConfigBuilder {
            title_min_length: defaults.title_min_length,
            title_max_length: defaults.title_max_length,
            header_band_ratio: defaults.header_band_ratio,
            footer_band_ratio: defaults.footer_band_ratio,
            boilerplate_titles: ListOverride::Default,
            outline_text_min_length: defaults.outline_text_min_length,
            outline_text_max_length: defaults.outline_text_max_length,
            max_pages_for_analysis: defaults.max_pages_for_analysis,
            max_outline_items: defaults.max_outline_items,
            size_outlier_factor: defaults.size_outlier_factor,
        }
    }
}

impl ExtractionConfigBuilder {
    pub fn title_length(mut self, min: usize, max: usize) -> Self {
        self.title_min_length = min;
        self.title_max_length = max;
        self
    }

    pub fn outline_text_length(mut self, min: usize, max: usize) -> Self {
        self.outline_text_min_length = min;
        self.outline_text_max_length = max;
        self
    }

    pub fn max_pages_for_analysis(mut self, pages: usize) -> Self {
        self.max_pages_for_analysis = pages;
        self
    }

    pub fn max_outline_items(mut self, items: usize) -> Self {
        self.max_outline_items = items;
        self
    }

    pub fn size_outlier_factor(mut self, factor: f32) -> Self {
        self.size_outlier_factor = factor;
        self
    }

    /// Header and footer exclusion bands as fractions of the page height.
    pub fn exclusion_bands(mut self, header: f32, footer: f32) -> Self {
        self.header_band_ratio = header;
        self.footer_band_ratio = footer;
        self
    }

    pub fn boilerplate_titles(mut self, titles: ListOverride<String>) -> Self {
        self.boilerplate_titles = titles;
        self
    }

    pub fn build(self) -> Result<ExtractionConfig, InvalidConfig> {
        if self.title_min_length == 0 {
            return Err(InvalidConfig("title_min_length must be at least 1".into()));
        }
        if self.title_min_length > self.title_max_length {
            return Err(InvalidConfig(format!(
                "title_min_length {} exceeds title_max_length {}",
                self.title_min_length, self.title_max_length
            )));
        }
        if self.outline_text_min_length == 0 {
            return Err(InvalidConfig(
                "outline_text_min_length must be at least 1".into(),
            ));
        }
        if self.outline_text_min_length > self.outline_text_max_length {
            return Err(InvalidConfig(format!(
                "outline_text_min_length {} exceeds outline_text_max_length {}",
                self.outline_text_min_length, self.outline_text_max_length
            )));
        }
        if self.max_pages_for_analysis == 0 {
            return Err(InvalidConfig(
                "max_pages_for_analysis must be at least 1".into(),
            ));
        }
        if self.max_outline_items == 0 {
            return Err(InvalidConfig("max_outline_items must be at least 1".into()));
        }
        if self.size_outlier_factor < 1.0 {
            return Err(InvalidConfig(
                "size_outlier_factor must be at least 1.0".into(),
            ));
        }
        for (name, ratio) in [
            ("header_band_ratio", self.header_band_ratio),
            ("footer_band_ratio", self.footer_band_ratio),
        ] {
            if !(0.0..0.5).contains(&ratio) {
                return Err(InvalidConfig(format!(
                    "{name} must be in [0.0, 0.5), got {ratio}"
                )));
            }
        }

        let defaults: Vec<String> = DEFAULT_BOILERPLATE_TITLES
            .iter()
            .map(|t| t.to_string())
            .collect();
        let boilerplate_titles = self
            .boilerplate_titles
            .resolve(&defaults)
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect();

        Ok(ExtractionConfig {
            title_min_length: self.title_min_length,
            title_max_length: self.title_max_length,
            header_band_ratio: self.header_band_ratio,
            footer_band_ratio: self.footer_band_ratio,
            boilerplate_titles,
            outline_text_min_length: self.outline_text_min_length,
            outline_text_max_length: self.outline_text_max_length,
            max_pages_for_analysis: self.max_pages_for_analysis,
            max_outline_items: self.max_outline_items,
            size_outlier_factor: self.size_outlier_factor,
        })
    }
}
