//! Image extraction from comment HTML
//!
//! Only JPEG and PNG images are handed to the classifier. The MIME type is
//! inferred from the URL suffix, not sniffed from the bytes.

use scraper::{Html, Selector};
use std::fmt;

/// Image formats the classifier accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Jpeg,
    Png,
}

impl ImageMime {
    /// Infers the format from a URL suffix (`jpg`, `jpeg` or `png`)
    pub fn from_url(url: &str) -> Option<Self> {
        if url.ends_with("jpg") || url.ends_with("jpeg") {
            Some(Self::Jpeg)
        } else if url.ends_with("png") {
            Some(Self::Png)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image reference found in a comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    pub mime: ImageMime,
}

/// Finds the first `<img src>` in `content` with a supported extension
///
/// # Example
///
/// ```
/// use comment_harvest::analyze::{extract_image, ImageMime};
///
/// let html = r#"<p><img src="https://img.example/a.gif"><img src="https://img.example/b.png"></p>"#;
/// let image = extract_image(html).unwrap();
/// assert_eq!(image.url, "https://img.example/b.png");
/// assert_eq!(image.mime, ImageMime::Png);
/// ```
pub fn extract_image(content: &str) -> Option<ImageRef> {
    let fragment = Html::parse_fragment(content);
    let selector = Selector::parse("img[src]").ok()?;

    fragment
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .find_map(|src| {
            ImageMime::from_url(src).map(|mime| ImageRef {
                url: src.to_string(),
                mime,
            })
        })
}
