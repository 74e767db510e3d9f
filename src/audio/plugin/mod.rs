//! Codec plugins.
//!
//! Every plugin, whatever codec sits behind it, answers the same two-phase
//! contract: [`CodecPlugin::process_send_data`] hands one input buffer over,
//! [`CodecPlugin::process_receive_data`] fills one output buffer. Protocol
//! signals travel in the `Ok` arm as a [`Status`]; failures are
//! [`CodecError`](crate::common::errors::CodecError)s.
//!
//! | Base | Per-codec parameterization |
//! |---|---|
//! | [`BaseDecoder`] | [`DecoderSpec`]: format checks, extradata, packet framing |
//! | [`BaseEncoder`] | [`EncoderSpec`]: format checks, packet header |

pub mod adts;
pub mod decoder;
pub mod encoder;
pub mod factory;

pub use decoder::{BaseDecoder, DecoderSpec, DecoderState};
pub use encoder::{BaseEncoder, EncoderSpec};
pub use factory::{create_by_mime, create_by_name};

use crate::{
    audio::{buffer::AudioBuffer, format::Format},
    common::errors::CodecResult,
};

/// Protocol outcome of a send or receive call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The call did its work.
    Ok,
    /// Output was written and more is ready now; call receive again without new input.
    Again,
    /// Backpressure: the other half of the protocol must run first.
    NotEnoughData,
    /// The stream has ended for this context.
    EndOfStream,
}

pub trait CodecPlugin: Send + Sync {
    /// Validate `format`, open the native codec and wire up conversion.
    fn init(&self, format: &Format) -> CodecResult<()>;

    /// Adjust parameters on an initialized plugin.
    fn set_parameter(&self, format: &Format) -> CodecResult<()>;

    fn process_send_data(&self, input: &AudioBuffer) -> CodecResult<Status>;

    fn process_receive_data(&self, output: &mut AudioBuffer) -> CodecResult<Status>;

    /// Tear down the native codec; the plugin must be initialized again.
    fn reset(&self) -> CodecResult<()>;

    /// Discard in-flight data, keep the native codec open.
    fn flush(&self) -> CodecResult<()>;

    /// Terminal teardown.
    fn release(&self) -> CodecResult<()>;

    /// The format produced on the output side.
    fn output_format(&self) -> Format;

    /// Capacity input buffers must have.
    fn input_buffer_size(&self) -> usize;

    /// Capacity output buffers must have.
    fn output_buffer_size(&self) -> usize;

    fn codec_name(&self) -> &'static str;
}
