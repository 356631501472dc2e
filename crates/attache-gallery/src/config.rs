use attache_core::Category;

/// Host-supplied gallery settings. Defaults mirror the common
/// read-only embedding: browsing every category, no uploads.
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Categories offered by the filter and compose selectors.
    pub categories: Vec<Category>,
    /// Category pre-selected on the compose form after each reset.
    pub default_category: Category,
    /// Whether the creation card (compose form + drop target) exists.
    pub creatable: bool,
    /// Page size for listing requests.
    pub page_limit: u32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            categories: ["audio", "video", "image", "text", "application"]
                .into_iter()
                .map(Category::new)
                .collect(),
            default_category: Category::none(),
            creatable: false,
            page_limit: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_read_only_with_the_standard_categories() {
        let config = GalleryConfig::default();
        assert!(!config.creatable);
        assert_eq!(config.page_limit, 20);
        assert!(config.default_category.is_none());
        let names: Vec<&str> = config.categories.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, ["audio", "video", "image", "text", "application"]);
    }
}
