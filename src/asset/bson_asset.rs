//! BSON asset (spec §4.4 "BSON asset (text)"): wraps an arbitrary BSON tree
//! verbatim, for config content that has no dedicated serializer.

use crate::bson::Tree;

/// An asset whose entire content is an opaque BSON tree.
#[derive(Debug, Clone, PartialEq)]
pub struct BsonAsset {
    pub tree: Tree,
}

/// Render the wrapped tree to text.
pub fn text_serialize(asset: &BsonAsset) -> String {
    crate::bson::write(&asset.tree)
}

/// Parse `text` into the wrapped tree.
pub fn text_deserialize(text: &str) -> anyhow::Result<BsonAsset> {
    Ok(BsonAsset {
        tree: crate::bson::parse_str(text)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_tree() {
        let text = "foo = 3\nbar = \"hi\"\n";
        let asset = text_deserialize(text).unwrap();
        let rendered = text_serialize(&asset);
        let reparsed = text_deserialize(&rendered).unwrap();
        assert_eq!(asset, reparsed);
    }
}
