use scraper::Html;

/// Browser switches that only matter for the rendered fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub headless: bool,
    pub incognito: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Always carries a scheme; see `normalize::with_scheme`.
    pub website: String,
    pub render: bool,
    pub options: FetchOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    pub name: String,
    pub url: String,
}

pub struct PageStructure {
    pub name: Option<String>,
    pub page: Html,
    images: Vec<ExtractedImage>,
}

impl PageStructure {
    pub fn new(name: Option<String>, page: Html) -> Self {
        Self {
            name,
            page,
            images: Vec::new(),
        }
    }

    pub fn images(&self) -> &[ExtractedImage] {
        &self.images
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.images.iter().any(|img| img.name == name)
    }

    /// Names come from the builder and are already unique.
    pub(crate) fn push_image(&mut self, image: ExtractedImage) {
        debug_assert!(!self.contains_name(&image.name));
        self.images.push(image);
    }
}
