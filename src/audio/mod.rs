mod asset;
mod detect;

pub use asset::{AudioAsset, mime_type_for, resolve, validate};
pub use detect::{
    AUDIO_EXTENSIONS, AudioReference, ReferenceKind, VIDEO_EXTENSIONS, detect, is_audio_extension,
    is_video_extension, strip_embeds,
};
