//! Plugin lookup by registered name or MIME type.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{
    BaseDecoder, BaseEncoder, CodecPlugin,
    decoder::{
        AacDecoderSpec, FlacDecoderSpec, G711DecoderSpec, MpegDecoderSpec, OpusDecoderSpec,
        VorbisDecoderSpec,
    },
    encoder::{AacEncoderSpec, G711EncoderSpec, OpusEncoderSpec, aac::unavailable_backend},
};
use crate::{
    audio::{
        format::{CodecId, CodecKind},
        native::{EncoderConfig, G711Encoder, G711Law, NativeEncoder, OpusEncoder},
    },
    common::errors::{CodecError, CodecResult},
};

/// Build the plugin registered as `name`
/// (e.g. `OH.Media.Codec.Decoder.Audio.AAC`).
pub fn create_by_name(name: &str) -> CodecResult<Box<dyn CodecPlugin>> {
    let Some((codec, kind)) = CodecId::from_plugin_name(name) else {
        warn!("PluginFactory: no plugin named {}", name);
        return Err(CodecError::Unsupported(format!("plugin {name}")));
    };
    debug!("PluginFactory: creating {}", name);
    Ok(build(codec, kind))
}

/// Build the plugin handling `mime` in the `kind` direction.
pub fn create_by_mime(mime: &str, kind: CodecKind) -> CodecResult<Box<dyn CodecPlugin>> {
    let codec = CodecId::from_mime(mime)
        .filter(|codec| codec.plugin_name(kind).is_some())
        .ok_or_else(|| {
            warn!("PluginFactory: no {:?} for {}", kind, mime);
            CodecError::Unsupported(format!("{kind:?} for {mime}"))
        })?;
    Ok(build(codec, kind))
}

fn build(codec: CodecId, kind: CodecKind) -> Box<dyn CodecPlugin> {
    match (codec, kind) {
        (CodecId::Aac, CodecKind::Decoder) => Box::new(BaseDecoder::new(AacDecoderSpec::default())),
        (CodecId::Flac, CodecKind::Decoder) => Box::new(BaseDecoder::new(FlacDecoderSpec)),
        (CodecId::Vorbis, CodecKind::Decoder) => Box::new(BaseDecoder::new(VorbisDecoderSpec)),
        (CodecId::Mpeg, CodecKind::Decoder) => Box::new(BaseDecoder::new(MpegDecoderSpec)),
        (CodecId::Opus, CodecKind::Decoder) => Box::new(BaseDecoder::new(OpusDecoderSpec)),
        (CodecId::G711Mu, CodecKind::Decoder) => {
            Box::new(BaseDecoder::new(G711DecoderSpec::new(G711Law::MuLaw)))
        }
        (CodecId::G711A, CodecKind::Decoder) => {
            Box::new(BaseDecoder::new(G711DecoderSpec::new(G711Law::ALaw)))
        }

        (CodecId::Opus, CodecKind::Encoder) => Box::new(BaseEncoder::with_factory(
            OpusEncoderSpec,
            Arc::new(|config: &EncoderConfig| {
                Ok(Box::new(OpusEncoder::open(config)?) as Box<dyn NativeEncoder>)
            }),
        )),
        (CodecId::G711Mu, CodecKind::Encoder) => g711_encoder(G711Law::MuLaw),
        (CodecId::G711A, CodecKind::Encoder) => g711_encoder(G711Law::ALaw),
        // Every other encoder slot (only AAC is registered) opens without a backend.
        (_, CodecKind::Encoder) => Box::new(BaseEncoder::with_factory(
            AacEncoderSpec::default(),
            unavailable_backend(),
        )),
    }
}

fn g711_encoder(law: G711Law) -> Box<dyn CodecPlugin> {
    Box::new(BaseEncoder::with_factory(
        G711EncoderSpec::new(law),
        Arc::new(move |_: &EncoderConfig| {
            Ok(Box::new(G711Encoder::new(law)) as Box<dyn NativeEncoder>)
        }),
    ))
}
