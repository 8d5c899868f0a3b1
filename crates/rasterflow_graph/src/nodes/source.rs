// SPDX-License-Identifier: MIT OR Apache-2.0
//! Source node that decodes a built-in image once and replays it.

use super::{Inputs, NodeError, Processor};
use crate::assets::{AssetResolver, BuiltinImage};
use crate::parameter::ParameterValue;
use crate::raster::Raster;
use std::sync::Arc;

/// Decodes the selected built-in image during setup and returns the cached
/// buffer every frame.
#[derive(Debug)]
pub struct ImageCache {
    assets: Arc<dyn AssetResolver>,
    cached: Option<Arc<Raster>>,
}

impl ImageCache {
    /// Create a source that resolves images through `assets`
    pub fn new(assets: Arc<dyn AssetResolver>) -> Self {
        Self {
            assets,
            cached: None,
        }
    }

    /// The decoded image, once setup has succeeded
    pub fn cached(&self) -> Option<&Arc<Raster>> {
        self.cached.as_ref()
    }

    async fn load(&self, selected: BuiltinImage) -> Result<Raster, NodeError> {
        let path = self
            .assets
            .resolve(selected)
            .ok_or_else(|| NodeError::ResourceLoad {
                resource: selected.to_string(),
                reason: "no asset location".to_string(),
            })?;
        let failure = |reason: String| NodeError::ResourceLoad {
            resource: path.display().to_string(),
            reason,
        };

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| failure(e.to_string()))?;
        let decoded = image::load_from_memory(&bytes).map_err(|e| failure(e.to_string()))?;
        Ok(decoded.to_rgba8())
    }
}

impl Processor for ImageCache {
    async fn setup(&mut self, inputs: Inputs<'_>) -> Result<(), NodeError> {
        let selected: BuiltinImage = inputs.selection("Image")?;
        self.cached = None;

        let raster = self.load(selected).await?;
        tracing::info!(
            "Cached {selected} ({}x{})",
            raster.width(),
            raster.height()
        );
        self.cached = Some(Arc::new(raster));
        Ok(())
    }

    async fn frame(&mut self, _inputs: Inputs<'_>) -> Result<ParameterValue, NodeError> {
        Ok(self
            .cached
            .clone()
            .map_or(ParameterValue::Null, ParameterValue::Raster))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::BuiltinAssets;
    use crate::id::IdRegistry;
    use crate::parameter::{DataType, Parameter, ParameterDef};
    use image::Rgba;

    fn selection(image: &str) -> Vec<Parameter> {
        let mut registry = IdRegistry::new();
        let node = registry.allocate_node();
        let def = ParameterDef::input("Image", DataType::Text, image);
        let id = registry.allocate_parameter(&node, def.direction, def.data_type);
        vec![Parameter::from_def(id, &def)]
    }

    #[tokio::test]
    async fn test_decodes_once_and_replays() {
        let dir = tempfile::tempdir().unwrap();
        let pixels = Raster::from_pixel(3, 2, Rgba([12, 34, 56, 255]));
        // Decoding sniffs the content, so PNG bytes load under any name
        pixels.save_with_format(dir.path().join("lena.bmp"), image::ImageFormat::Png).unwrap();

        let mut node = ImageCache::new(Arc::new(BuiltinAssets::new(dir.path())));
        let params = selection("Lena");
        node.setup(Inputs::new(&params)).await.unwrap();

        // Deleting the file proves frames never re-decode
        std::fs::remove_file(dir.path().join("lena.bmp")).unwrap();
        let first = node.frame(Inputs::new(&params)).await.unwrap();
        let second = node.frame(Inputs::new(&params)).await.unwrap();

        let raster = first.as_raster().unwrap();
        assert_eq!(raster.dimensions(), (3, 2));
        assert_eq!(raster.get_pixel(2, 1).0, [12, 34, 56, 255]);
        assert!(Arc::ptr_eq(raster, second.as_raster().unwrap()));
    }

    #[tokio::test]
    async fn test_missing_file_fails_setup() {
        let dir = tempfile::tempdir().unwrap();
        let mut node = ImageCache::new(Arc::new(BuiltinAssets::new(dir.path())));
        let params = selection("Gradient Horizontal");

        let err = node.setup(Inputs::new(&params)).await.unwrap_err();
        assert!(matches!(err, NodeError::ResourceLoad { .. }));
        assert!(node.cached().is_none());
        assert!(node.frame(Inputs::new(&params)).await.unwrap().is_null());
    }

    #[tokio::test]
    async fn test_unknown_image_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let mut node = ImageCache::new(Arc::new(BuiltinAssets::new(dir.path())));
        let params = selection("Mandrill");

        let err = node.setup(Inputs::new(&params)).await.unwrap_err();
        assert!(matches!(err, NodeError::UnsupportedOperation { .. }));
    }
}
