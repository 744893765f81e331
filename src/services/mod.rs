pub mod image;
pub mod shopping_list;

pub use image::{DecodedImage, ImageError, ImageService, decode_data_uri};
pub use shopping_list::render_shopping_list;
