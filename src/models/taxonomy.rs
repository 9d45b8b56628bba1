//! Static taxonomy tables: canonical towns and categories with their aliases.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::TaxonomyError;

/// Which entity table an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Town,
    Category,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyEntity {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl TaxonomyEntity {
    pub fn new(id: &str, label: &str, synonyms: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            icon: None,
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }
}

/// Both entity tables. Order inside each table is the synonym priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub towns: Vec<TaxonomyEntity>,
    pub categories: Vec<TaxonomyEntity>,
}

impl Taxonomy {
    pub fn from_json_str(json: &str) -> Result<Self, TaxonomyError> {
        let taxonomy: Taxonomy = serde_json::from_str(json)?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Rejects tables containing the same id twice.
    pub fn validate(&self) -> Result<(), TaxonomyError> {
        for table in [&self.towns, &self.categories] {
            let mut seen = HashSet::new();
            for entity in table {
                if !seen.insert(entity.id.as_str()) {
                    return Err(TaxonomyError::DuplicateId(entity.id.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn entities(&self, kind: EntityKind) -> &[TaxonomyEntity] {
        match kind {
            EntityKind::Town => &self.towns,
            EntityKind::Category => &self.categories,
        }
    }

    pub fn label(&self, kind: EntityKind, id: &str) -> Option<&str> {
        self.entities(kind)
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.label.as_str())
    }

    /// Built-in tables for the province of Huelva.
    pub fn huelva() -> Self {
        let towns = vec![
            TaxonomyEntity::new("huelva", "Huelva", &["huelva capital"]),
            TaxonomyEntity::new("almonte", "Almonte", &["matalascañas", "el rocio", "rocio"]),
            TaxonomyEntity::new("moguer", "Moguer", &["mazagon"]),
            TaxonomyEntity::new("palos", "Palos de la Frontera", &["palos frontera"]),
            TaxonomyEntity::new("lepe", "Lepe", &["la antilla"]),
            TaxonomyEntity::new("isla_cristina", "Isla Cristina", &["islantilla"]),
            TaxonomyEntity::new("ayamonte", "Ayamonte", &["isla canela", "punta del moral"]),
            TaxonomyEntity::new("punta_umbria", "Punta Umbría", &["el portil"]),
            TaxonomyEntity::new("cartaya", "Cartaya", &["el rompido"]),
            TaxonomyEntity::new("aracena", "Aracena", &["sierra de aracena"]),
            TaxonomyEntity::new("nerva", "Nerva", &[]),
            TaxonomyEntity::new("minas_de_riotinto", "Minas de Riotinto", &["riotinto", "rio tinto"]),
        ];
        let categories = vec![
            TaxonomyEntity::new("playas", "Playas", &["playa", "costa", "chiringuitos"])
                .with_icon("/icons/playas.svg"),
            TaxonomyEntity::new("naturaleza", "Naturaleza", &["espacios naturales", "doñana", "parques"])
                .with_icon("/icons/naturaleza.svg"),
            TaxonomyEntity::new("gastronomia", "Gastronomía", &["restaurantes", "comida", "jamon"])
                .with_icon("/icons/gastronomia.svg"),
            TaxonomyEntity::new("patrimonio", "Patrimonio", &["monumentos", "museos", "historia"])
                .with_icon("/icons/patrimonio.svg"),
            TaxonomyEntity::new("fiestas", "Fiestas y Tradiciones", &["romeria", "carnaval", "semana santa"])
                .with_icon("/icons/fiestas.svg"),
            TaxonomyEntity::new("alojamiento", "Alojamiento", &["hoteles", "camping", "apartamentos"])
                .with_icon("/icons/alojamiento.svg"),
            TaxonomyEntity::new("deportes", "Deportes", &["golf", "surf", "senderismo"])
                .with_icon("/icons/deportes.svg"),
            TaxonomyEntity::new("ocio_nocturno", "Ocio Nocturno", &["discotecas", "bares de copas"])
                .with_icon("/icons/ocio_nocturno.svg"),
        ];
        Self { towns, categories }
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::huelva()
    }
}
