use futures::future::{FutureExt, LocalBoxFuture};

use crate::error::TransformError;

/// Remote image processing, e.g. AI background removal. Returns the URL of
/// the processed image; loading it is the caller's business.
pub trait ImageTransformer {
    fn remove_background<'a>(
        &'a self,
        source_url: &'a str,
    ) -> LocalBoxFuture<'a, Result<String, TransformError>>;
}

const IMAGEKIT_HOST: &str = "ik.imagekit.io";
const BACKGROUND_REMOVAL: &str = "tr=e-bgremove";

/// URL of the background-removed variant of an ImageKit image. Any existing
/// transformation query is replaced. Other hosts come back unchanged.
pub fn background_removed_url(url: &str) -> String {
    if !url.contains(IMAGEKIT_HOST) {
        return url.to_owned();
    }
    let base = url.split('?').next().unwrap_or(url);
    format!("{base}?{BACKGROUND_REMOVAL}")
}

/// Transformations expressed as ImageKit URL parameters
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageKitTransformer;

impl ImageTransformer for ImageKitTransformer {
    fn remove_background<'a>(
        &'a self,
        source_url: &'a str,
    ) -> LocalBoxFuture<'a, Result<String, TransformError>> {
        async move {
            if source_url.is_empty() {
                return Err(TransformError::NoSource);
            }
            Ok(background_removed_url(source_url))
        }
        .boxed_local()
    }
}
