use anyhow::{anyhow, Context, Result};
use roxmltree::{Document, Node};

use crate::params::{GalaxyChange, GalaxyParameters, StarFieldChange, StarFieldParameters};

/// Start-up parameters for both fields.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Preset {
    pub galaxy: GalaxyParameters,
    pub stars: StarFieldParameters,
}

impl Preset {
    /// Parses a preset document:
    ///
    /// ```xml
    /// <preset>
    ///     <galaxy><count>50000</count><insideColor>#ff6030</insideColor></galaxy>
    ///     <stars><radius>40</radius></stars>
    /// </preset>
    /// ```
    ///
    /// Missing sections and elements keep their defaults.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid preset XML")?;
        let root = document.root_element();
        if !root.has_tag_name("preset") {
            return Err(anyhow!(
                "expected <preset> root element, found <{}>",
                root.tag_name().name()
            ));
        }

        let mut preset = Self::default();
        if let Some(galaxy) = child(&root, "galaxy") {
            for (key, value) in fields(&galaxy) {
                let change = GalaxyChange::parse(&key, &value)
                    .with_context(|| format!("in <galaxy><{key}>"))?;
                preset.galaxy.apply(change);
            }
        }
        if let Some(stars) = child(&root, "stars") {
            for (key, value) in fields(&stars) {
                let change = StarFieldChange::parse(&key, &value)
                    .with_context(|| format!("in <stars><{key}>"))?;
                preset.stars.apply(change);
            }
        }

        preset.galaxy.validate().context("invalid <galaxy> section")?;
        preset.stars.validate().context("invalid <stars> section")?;
        Ok(preset)
    }
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn fields(node: &Node<'_, '_>) -> Vec<(String, String)> {
    node.children()
        .filter(Node::is_element)
        .filter_map(|child| {
            let text = child.text().map(str::trim).filter(|text| !text.is_empty())?;
            Some((child.tag_name().name().to_string(), text.to_string()))
        })
        .collect()
}
