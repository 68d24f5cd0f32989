//! Style proposals and their product recommendations.
//!
//! A proposal is assembled from two independent backend results: the
//! restyled image and the structured [`StyleDetails`]. Only the image is
//! ever replaced afterwards.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::image::EncodedImage;
use crate::prompts::MAX_PRODUCTS;
use crate::style::StyleDefinition;

/// Marketplace search base used for derived product links.
pub const MARKETPLACE_SEARCH_BASE: &str = "https://listado.mercadolibre.com.ar";

/// Host fragment identifying a link that already points at the marketplace.
const MARKETPLACE_HOST: &str = "mercadolibre.";

/// Runs of anything that is not an ASCII letter or digit.
static SLUG_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

// ---------------------------------------------------------------------------
// Wire-facing details
// ---------------------------------------------------------------------------

/// A product as suggested by the backend. The URL is optional in the
/// response schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductSuggestion {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Structured style description returned by the backend.
///
/// All four fields are required; a reply missing any of them fails to
/// deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDetails {
    pub description: String,
    pub furniture_recs: String,
    pub color_recs: String,
    pub products: Vec<ProductSuggestion>,
}

impl StyleDetails {
    /// Normalized product list: blank names dropped, at most
    /// [`MAX_PRODUCTS`] kept, every URL a marketplace link.
    pub fn normalized_products(&self) -> Vec<Product> {
        self.products
            .iter()
            .filter(|p| !p.name.trim().is_empty())
            .take(MAX_PRODUCTS)
            .map(Product::from_suggestion)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub name: String,
    pub url: String,
}

impl Product {
    fn from_suggestion(suggestion: &ProductSuggestion) -> Self {
        let name = suggestion.name.trim().to_string();
        let url = suggestion
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| is_marketplace_link(u))
            .map(str::to_string)
            .unwrap_or_else(|| marketplace_link(&name));
        Self { name, url }
    }
}

/// Whether `url` is an http(s) link on the marketplace domain.
pub fn is_marketplace_link(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split('/').next().unwrap_or_default();
            host.contains(MARKETPLACE_HOST)
        }
        None => false,
    }
}

/// Derive a marketplace search link from a product name.
///
/// `"Lámpara de pie nórdica"` becomes
/// `https://listado.mercadolibre.com.ar/lampara-de-pie-nordica`.
pub fn marketplace_link(name: &str) -> String {
    let folded: String = name.to_lowercase().chars().map(fold_diacritic).collect();
    let slug = SLUG_SEPARATOR_RE.replace_all(&folded, "-");
    format!("{MARKETPLACE_SEARCH_BASE}/{}", slug.trim_matches('-'))
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

// ---------------------------------------------------------------------------
// StyleProposal
// ---------------------------------------------------------------------------

/// One generated decorating variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleProposal {
    pub id: String,
    pub name: String,
    pub image: EncodedImage,
    pub description: String,
    pub furniture_recs: String,
    pub color_recs: String,
    pub products: Vec<Product>,
    /// MIME type of the original upload; edits are sent with it.
    pub original_mime_type: String,
    /// Number of successful edits applied to `image`.
    pub edit_count: u32,
}

impl StyleProposal {
    /// Merge a restyled image and its details into a proposal.
    pub fn assemble(
        style: &StyleDefinition,
        image: EncodedImage,
        details: StyleDetails,
        original_mime_type: impl Into<String>,
    ) -> Self {
        let products = details.normalized_products();
        Self {
            id: style.id.to_string(),
            name: style.name.to_string(),
            image,
            description: details.description.trim().to_string(),
            furniture_recs: details.furniture_recs.trim().to_string(),
            color_recs: details.color_recs.trim().to_string(),
            products,
            original_mime_type: original_mime_type.into(),
            edit_count: 0,
        }
    }

    /// Swap in an edited image. Nothing else on the proposal changes.
    pub fn replace_image(&mut self, image: EncodedImage) {
        self.image = image;
        self.edit_count += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
