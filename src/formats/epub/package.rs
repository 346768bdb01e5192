//! Container and package descriptor (OPF) parsing

use serde::Deserialize;

use crate::document::{DocumentError, Result};

/// Location of the container descriptor inside every EPUB
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Properties token marking the cover image in EPUB 3 manifests
const COVER_IMAGE_PROPERTY: &str = "cover-image";

/// Package descriptor path named by `container.xml`
pub fn descriptor_path(container_xml: &str) -> Result<String> {
    let container: OcfContainer = quick_xml::de::from_str(strip_bom(container_xml))?;
    container
        .rootfiles
        .and_then(|rootfiles| rootfiles.rootfile.into_iter().find_map(|r| r.full_path))
        .filter(|path| !path.trim().is_empty())
        .ok_or_else(|| DocumentError::Corrupt("container.xml names no package descriptor".to_string()))
}

/// The parts of a package descriptor the reader needs
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub title: Option<String>,
    pub author: Option<String>,
    pub manifest: Vec<ManifestItem>,
    /// Manifest ids in reading order
    pub spine: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Relative to the descriptor's directory, still percent-encoded
    pub href: String,
    pub media_type: String,
    pub properties: Vec<String>,
}

impl ManifestItem {
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

impl Package {
    pub fn parse(opf_xml: &str) -> Result<Self> {
        let package: OpfPackage = quick_xml::de::from_str(strip_bom(opf_xml))?;

        let (title, author) = match package.metadata {
            Some(metadata) => (first_text(metadata.title), first_text(metadata.creator)),
            None => (None, None),
        };

        let manifest = package
            .manifest
            .map(|m| m.item)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                Some(ManifestItem {
                    id: item.id?,
                    href: item.href?,
                    media_type: item.media_type.unwrap_or_default(),
                    properties: item
                        .properties
                        .map(|p| p.split_whitespace().map(str::to_string).collect())
                        .unwrap_or_default(),
                })
            })
            .collect();

        let spine = package
            .spine
            .map(|s| s.itemref)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|itemref| itemref.idref)
            .collect();

        Ok(Self {
            title,
            author,
            manifest,
            spine,
        })
    }

    pub fn item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// Cover image: the `cover-image` property wins, then an image whose id
    /// mentions "cover"
    pub fn cover_item(&self) -> Option<&ManifestItem> {
        self.manifest
            .iter()
            .find(|item| item.has_property(COVER_IMAGE_PROPERTY))
            .or_else(|| {
                self.manifest
                    .iter()
                    .find(|item| item.is_image() && item.id.to_lowercase().contains("cover"))
            })
    }
}

fn strip_bom(xml: &str) -> &str {
    xml.trim_start_matches('\u{feff}')
}

fn first_text(elements: Vec<DcElement>) -> Option<String> {
    elements
        .into_iter()
        .filter_map(|e| e.content)
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
}

// XML structures for deserialization

#[derive(Debug, Deserialize)]
struct OcfContainer {
    rootfiles: Option<OcfRootFiles>,
}

#[derive(Debug, Deserialize)]
struct OcfRootFiles {
    #[serde(rename = "rootfile", default)]
    rootfile: Vec<OcfRootFile>,
}

#[derive(Debug, Deserialize)]
struct OcfRootFile {
    #[serde(rename = "@full-path", default)]
    full_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpfPackage {
    metadata: Option<OpfMetadata>,
    manifest: Option<OpfManifest>,
    spine: Option<OpfSpine>,
}

#[derive(Debug, Deserialize)]
struct OpfMetadata {
    #[serde(rename = "title", default)]
    title: Vec<DcElement>,

    #[serde(rename = "creator", default)]
    creator: Vec<DcElement>,
}

#[derive(Debug, Deserialize)]
struct DcElement {
    #[serde(rename = "$text", default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpfManifest {
    #[serde(rename = "item", default)]
    item: Vec<OpfManifestItem>,
}

#[derive(Debug, Deserialize)]
struct OpfManifestItem {
    #[serde(rename = "@id", default)]
    id: Option<String>,

    #[serde(rename = "@href", default)]
    href: Option<String>,

    #[serde(rename = "@media-type", default)]
    media_type: Option<String>,

    #[serde(rename = "@properties", default)]
    properties: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpfSpine {
    #[serde(rename = "itemref", default)]
    itemref: Vec<OpfItemRef>,
}

#[derive(Debug, Deserialize)]
struct OpfItemRef {
    #[serde(rename = "@idref", default)]
    idref: Option<String>,
}
