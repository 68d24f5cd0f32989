//! Fixed instruction texts sent to the generation backend.
//!
//! The product is Spanish-language, so every instruction asks for Spanish
//! output.

/// Instruction paired with the room photo for the space analysis.
pub const ANALYZE_SPACE_PROMPT: &str = "Analiza esta imagen. Entre 13 y 30 palabras, \
    identifica el tipo de espacio (ej. sala de estar, dormitorio) y describe su estilo \
    actual. Responde en español.";

/// Upper bound on products requested per style (and kept from the reply).
pub const MAX_PRODUCTS: usize = 5;

/// Build the structured-description request for a style display name.
pub fn describe_style_prompt(style_name: &str) -> String {
    format!(
        "Genera una descripción para el estilo de decoración '{style_name}'. Basado en este \
         estilo, proporciona recomendaciones de mobiliario, recomendaciones de paleta de \
         colores, y una lista de {MAX_PRODUCTS} productos decorativos que se podrían encontrar \
         en mercadolibre.com. Responde en español."
    )
}
