//! Records returned by the FIPE API
//!
//! The API is not consistent about scalar types: brand codes arrive as
//! strings while model codes, model years and vehicle types arrive as
//! numbers. Those fields are accepted in either form and kept as text.
//! Field names are accepted in camelCase and PascalCase.

use serde::{Deserialize, Deserializer};

/// A manufacturer in the FIPE taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Brand {
    #[serde(rename = "codigo", alias = "Codigo", deserialize_with = "text_or_number")]
    pub code: String,

    #[serde(rename = "nome", alias = "Nome")]
    pub name: String,
}

/// A model, scoped to its parent brand
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Model {
    #[serde(rename = "codigo", alias = "Codigo", deserialize_with = "text_or_number")]
    pub code: String,

    #[serde(rename = "nome", alias = "Nome")]
    pub name: String,
}

/// Wrapper the API returns for a brand's model list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelList {
    #[serde(rename = "modelos", alias = "Modelos", default)]
    pub models: Vec<Option<Model>>,
}

/// A model-year/fuel combination, scoped to a (brand, model) pair
///
/// The code looks like `2020-1`: model year, then fuel discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Year {
    #[serde(rename = "codigo", alias = "Codigo", deserialize_with = "text_or_number")]
    pub code: String,

    #[serde(rename = "nome", alias = "Nome")]
    pub name: String,
}

/// The price of one (brand, model, year), the leaf of the traversal
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriceRecord {
    /// Formatted currency string, e.g. `R$ 30.000,00`
    #[serde(rename = "valor", alias = "Valor")]
    pub value: String,

    #[serde(rename = "marca", alias = "Marca")]
    pub brand: String,

    #[serde(rename = "modelo", alias = "Modelo")]
    pub model: String,

    #[serde(
        rename = "anoModelo",
        alias = "AnoModelo",
        deserialize_with = "text_or_number"
    )]
    pub model_year: String,

    #[serde(rename = "combustivel", alias = "Combustivel")]
    pub fuel: String,

    #[serde(rename = "siglaCombustivel", alias = "SiglaCombustivel")]
    pub fuel_code: String,

    #[serde(rename = "codigoFipe", alias = "CodigoFipe")]
    pub fipe_code: String,

    /// Reference month, e.g. `março de 2024`
    #[serde(rename = "mesReferencia", alias = "MesReferencia")]
    pub reference_month: String,

    #[serde(
        rename = "tipoVeiculo",
        alias = "TipoVeiculo",
        deserialize_with = "text_or_number"
    )]
    pub vehicle_type: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Integer(n) => n.to_string(),
        Scalar::Float(f) => f.to_string(),
    })
}
