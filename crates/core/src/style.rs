//! The fixed catalog of decorating styles offered for every room.

use serde::Serialize;

/// Number of proposals produced by the initial generation step.
pub const PROPOSAL_COUNT: usize = 3;

pub const STYLE_NORDIC: &str = "nordico";
pub const STYLE_MODERN: &str = "moderno";
pub const STYLE_CLASSIC: &str = "clasico";

/// One catalog entry: stable id, display name and the instruction sent to
/// the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub instruction: &'static str,
}

/// Catalog order is the display order of the proposal grid.
pub const STYLE_CATALOG: [StyleDefinition; PROPOSAL_COUNT] = [
    StyleDefinition {
        id: STYLE_NORDIC,
        name: "Nórdico",
        instruction: "Redecora esta habitación con un estilo nórdico (escandinavo). \
            Prioriza la luz natural, utiliza maderas claras, textiles acogedores y una \
            paleta de colores blancos, grises y pasteles.",
    },
    StyleDefinition {
        id: STYLE_MODERN,
        name: "Moderno",
        instruction: "Redecora esta habitación con un estilo moderno. Utiliza líneas \
            limpias, una paleta de colores neutros con toques de color audaces y \
            mobiliario minimalista.",
    },
    StyleDefinition {
        id: STYLE_CLASSIC,
        name: "Clásico Contemporáneo",
        instruction: "Redecora esta habitación con un estilo clásico contemporáneo. \
            Combina elementos clásicos como molduras con mobiliario moderno y elegante. \
            Utiliza una paleta de colores sofisticada y materiales de lujo.",
    },
];

/// Look up a catalog style by id.
pub fn find_style(id: &str) -> Option<&'static StyleDefinition> {
    STYLE_CATALOG.iter().find(|s| s.id == id)
}

/// Whether `id` names a catalog style.
pub fn is_catalog_style(id: &str) -> bool {
    find_style(id).is_some()
}
