//! Codec identity table: plugin names, MIME types and direction.

/// Which way a plugin converts data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    Decoder,
    Encoder,
}

/// Audio codecs known to the plugin layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    Aac,
    Flac,
    Vorbis,
    Mpeg,
    G711Mu,
    G711A,
    Opus,
}

struct CodecEntry {
    id: CodecId,
    mime: &'static str,
    decoder: Option<&'static str>,
    encoder: Option<&'static str>,
}

static CODECS: [CodecEntry; 7] = [
    CodecEntry {
        id: CodecId::Aac,
        mime: "audio/mp4a-latm",
        decoder: Some("OH.Media.Codec.Decoder.Audio.AAC"),
        encoder: Some("OH.Media.Codec.Encoder.Audio.AAC"),
    },
    CodecEntry {
        id: CodecId::Flac,
        mime: "audio/flac",
        decoder: Some("OH.Media.Codec.Decoder.Audio.Flac"),
        encoder: None,
    },
    CodecEntry {
        id: CodecId::Vorbis,
        mime: "audio/vorbis",
        decoder: Some("OH.Media.Codec.Decoder.Audio.Vorbis"),
        encoder: None,
    },
    CodecEntry {
        id: CodecId::Mpeg,
        mime: "audio/mpeg",
        decoder: Some("OH.Media.Codec.Decoder.Audio.Mpeg"),
        encoder: None,
    },
    CodecEntry {
        id: CodecId::G711Mu,
        mime: "audio/g711mu",
        decoder: Some("OH.Media.Codec.Decoder.Audio.G711mu"),
        encoder: Some("OH.Media.Codec.Encoder.Audio.G711mu"),
    },
    CodecEntry {
        id: CodecId::G711A,
        mime: "audio/g711a",
        decoder: Some("OH.Media.Codec.Decoder.Audio.G711a"),
        encoder: Some("OH.Media.Codec.Encoder.Audio.G711a"),
    },
    CodecEntry {
        id: CodecId::Opus,
        mime: "audio/opus",
        decoder: Some("OH.Media.Codec.Decoder.Audio.Opus"),
        encoder: Some("OH.Media.Codec.Encoder.Audio.Opus"),
    },
];

impl CodecId {
    fn entry(self) -> &'static CodecEntry {
        // Every variant has exactly one table row.
        CODECS
            .iter()
            .find(|e| e.id == self)
            .unwrap_or(&CODECS[0])
    }

    pub fn mime(self) -> &'static str {
        self.entry().mime
    }

    /// Registered plugin name for the given direction, if the codec supports it.
    pub fn plugin_name(self, kind: CodecKind) -> Option<&'static str> {
        match kind {
            CodecKind::Decoder => self.entry().decoder,
            CodecKind::Encoder => self.entry().encoder,
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        CODECS
            .iter()
            .find(|e| e.mime.eq_ignore_ascii_case(mime))
            .map(|e| e.id)
    }

    /// Resolve a plugin name to its codec and direction.
    pub fn from_plugin_name(name: &str) -> Option<(Self, CodecKind)> {
        CODECS.iter().find_map(|e| {
            if e.decoder == Some(name) {
                Some((e.id, CodecKind::Decoder))
            } else if e.encoder == Some(name) {
                Some((e.id, CodecKind::Encoder))
            } else {
                None
            }
        })
    }
}
