//! Quality catalog and format selection for remote sources.
//!
//! The extraction engine reports its available formats as JSON metadata
//! (the usual extractor shape: per-format height, codecs, sizes). The
//! catalog collapses that into a deduplicated, rank-ordered set of quality
//! rungs, and the caller's quality hint is resolved against it with a
//! fixed precedence table.

use serde::{Deserialize, Deserializer};

/// Fixed resolution rank order, highest first. The catalog is keyed by
/// this table; heights not listed do not form rungs of their own.
const RESOLUTION_RANK: [(&str, u32); 6] = [
    ("2160p", 2160),
    ("1440p", 1440),
    ("1080p", 1080),
    ("720p", 720),
    ("480p", 480),
    ("360p", 360),
];

/// Filename tokens mapped to display labels, checked highest first.
const RESOLUTION_TOKENS: [(&str, &str); 6] = [
    ("2160p", "4K"),
    ("1440p", "1440p"),
    ("1080p", "1080p"),
    ("720p", "720p"),
    ("480p", "480p"),
    ("360p", "360p"),
];

/// Infers the active quality rung from a filename hint the engine passes
/// through its progress callback (output templates commonly embed the
/// resolution token).
pub fn infer_rung_from_name(name: &str) -> Option<&'static str> {
    RESOLUTION_TOKENS
        .iter()
        .find(|(token, _)| name.contains(token))
        .map(|(_, label)| *label)
}

/// Metadata the extraction engine reports for a URL in metadata-only mode.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub filesize_approx: Option<u64>,
    #[serde(default)]
    pub formats: Vec<MediaFormat>,
}

/// One format entry from the engine's metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaFormat {
    pub format_id: String,
    pub ext: Option<String>,
    pub height: Option<u32>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub filesize: Option<u64>,
}

impl MediaFormat {
    fn has_video(&self) -> bool {
        !matches!(self.vcodec.as_deref(), None | Some("none"))
    }

    fn has_audio(&self) -> bool {
        !matches!(self.acodec.as_deref(), None | Some("none"))
    }
}

/// One discrete resolution tier offered by the remote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityRung {
    pub label: &'static str,
    pub height: u32,
}

/// Resolved view of a remote source before download: stream identity plus
/// the deduplicated, rank-ordered set of available quality rungs.
///
/// Transient — built once per remote request and discarded after the
/// acquisition decision is made.
#[derive(Debug, Clone)]
pub struct QualityCatalog {
    pub title: String,
    pub duration_secs: Option<f64>,
    pub uploader: Option<String>,
    pub total_size: Option<u64>,
    pub rungs: Vec<QualityRung>,
    pub has_audio: bool,
}

impl QualityCatalog {
    pub fn from_metadata(meta: &MediaMetadata) -> Self {
        let mut rungs = Vec::new();
        for (label, height) in RESOLUTION_RANK {
            let available = meta
                .formats
                .iter()
                .any(|f| f.has_video() && f.height == Some(height));
            if available {
                rungs.push(QualityRung { label, height });
            }
        }

        let has_audio = meta.formats.iter().any(|f| f.has_audio());

        // Best-effort total: the engine's approximation, else the largest
        // reported per-format size.
        let total_size = meta
            .filesize_approx
            .or_else(|| meta.formats.iter().filter_map(|f| f.filesize).max());

        Self {
            title: meta.title.clone().unwrap_or_else(|| "untitled".into()),
            duration_secs: meta.duration,
            uploader: meta.uploader.clone(),
            total_size,
            rungs,
            has_audio,
        }
    }

    /// The highest available rung, if any video stream exists.
    pub fn best_rung(&self) -> Option<QualityRung> {
        self.rungs.first().copied()
    }
}

/// Caller-supplied quality preference, parsed from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityHint {
    /// Best video capped at the configured ceiling.
    #[default]
    Best,
    /// Best video at or below this height.
    Height(u32),
    /// Audio-only stream.
    Audio,
}

impl QualityHint {
    /// Parses a hint string. `"best"`, `"audio"` and `"<height>p"` are
    /// recognized; anything else falls back to `Best`.
    pub fn parse(hint: &str) -> Self {
        let hint = hint.trim().to_lowercase();
        match hint.as_str() {
            "best" => QualityHint::Best,
            "audio" => QualityHint::Audio,
            other => match other.strip_suffix('p').and_then(|h| h.parse::<u32>().ok()) {
                Some(height) => QualityHint::Height(height),
                None => QualityHint::Best,
            },
        }
    }
}

// Hints arrive as free-form strings in the request payload; unrecognized
// values fall back to `Best` rather than failing deserialization.
impl<'de> Deserialize<'de> for QualityHint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(QualityHint::parse(&raw))
    }
}

/// Concrete format selector handed to the extraction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSelector {
    /// Best video at or below `max_height`, merged with best audio.
    Video { max_height: u32 },
    /// Best audio-only stream.
    AudioOnly,
}

impl FormatSelector {
    /// Renders the selector as an extractor-style format expression.
    pub fn expression(&self) -> String {
        match self {
            FormatSelector::Video { max_height } => {
                format!("bestvideo[height<={max_height}]+bestaudio/best[height<={max_height}]")
            }
            FormatSelector::AudioOnly => "bestaudio/best".into(),
        }
    }

    /// Container extensions an output file of this selector may carry.
    pub fn expected_extensions(&self) -> &'static [&'static str] {
        match self {
            FormatSelector::Video { .. } => &["mp4", "mkv", "webm", "mov"],
            FormatSelector::AudioOnly => &["m4a", "mp3", "opus", "ogg", "webm", "flac", "wav"],
        }
    }
}

/// Maps a quality hint to a concrete selector against the catalog.
///
/// Precedence: `best` caps at `ceiling`; a height hint selects the exact
/// or next-lower available rung, else the next best overall; `audio`
/// selects audio-only.
pub fn resolve_selector(hint: QualityHint, catalog: &QualityCatalog, ceiling: u32) -> FormatSelector {
    match hint {
        QualityHint::Audio => FormatSelector::AudioOnly,
        QualityHint::Best => FormatSelector::Video {
            max_height: ceiling,
        },
        QualityHint::Height(height) => {
            if let Some(rung) = catalog.rungs.iter().find(|r| r.height <= height) {
                // Exact or next-lower available rung.
                FormatSelector::Video {
                    max_height: rung.height,
                }
            } else if let Some(best) = catalog.best_rung() {
                // Hinted below everything available — next best overall.
                FormatSelector::Video {
                    max_height: best.height,
                }
            } else {
                // No video rungs at all; let the engine pick its best.
                FormatSelector::Video {
                    max_height: ceiling,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_format(id: &str, height: u32) -> MediaFormat {
        MediaFormat {
            format_id: id.into(),
            ext: Some("mp4".into()),
            height: Some(height),
            vcodec: Some("avc1".into()),
            acodec: Some("none".into()),
            filesize: Some(height as u64 * 1000),
        }
    }

    fn audio_format(id: &str) -> MediaFormat {
        MediaFormat {
            format_id: id.into(),
            ext: Some("m4a".into()),
            height: None,
            vcodec: Some("none".into()),
            acodec: Some("mp4a".into()),
            filesize: Some(5000),
        }
    }

    fn sample_catalog(heights: &[u32]) -> QualityCatalog {
        let mut formats: Vec<MediaFormat> = heights
            .iter()
            .enumerate()
            .map(|(i, h)| video_format(&format!("f{i}"), *h))
            .collect();
        formats.push(audio_format("a1"));
        QualityCatalog::from_metadata(&MediaMetadata {
            title: Some("Sample".into()),
            duration: Some(60.0),
            uploader: Some("someone".into()),
            filesize_approx: None,
            formats,
        })
    }

    #[test]
    fn catalog_rungs_ranked_and_deduplicated() {
        // Duplicate 720p entries collapse into one rung.
        let catalog = sample_catalog(&[480, 720, 720, 1080]);
        let labels: Vec<&str> = catalog.rungs.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["1080p", "720p", "480p"]);
        assert!(catalog.has_audio);
    }

    #[test]
    fn catalog_unlisted_heights_do_not_form_rungs() {
        let catalog = sample_catalog(&[540, 720]);
        let labels: Vec<&str> = catalog.rungs.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["720p"]);
    }

    #[test]
    fn catalog_total_size_prefers_engine_approximation() {
        let mut meta = MediaMetadata {
            title: None,
            duration: None,
            uploader: None,
            filesize_approx: Some(9999),
            formats: vec![video_format("f1", 720)],
        };
        assert_eq!(QualityCatalog::from_metadata(&meta).total_size, Some(9999));

        meta.filesize_approx = None;
        assert_eq!(
            QualityCatalog::from_metadata(&meta).total_size,
            Some(720_000)
        );
    }

    #[test]
    fn catalog_missing_title_defaults() {
        let meta = MediaMetadata {
            title: None,
            duration: None,
            uploader: None,
            filesize_approx: None,
            formats: vec![],
        };
        assert_eq!(QualityCatalog::from_metadata(&meta).title, "untitled");
    }

    #[test]
    fn hint_parsing() {
        assert_eq!(QualityHint::parse("best"), QualityHint::Best);
        assert_eq!(QualityHint::parse("AUDIO"), QualityHint::Audio);
        assert_eq!(QualityHint::parse("720p"), QualityHint::Height(720));
        assert_eq!(QualityHint::parse(" 1080P "), QualityHint::Height(1080));
        // Unrecognized hints fall back to best.
        assert_eq!(QualityHint::parse("potato"), QualityHint::Best);
        assert_eq!(QualityHint::parse("4k"), QualityHint::Best);
    }

    #[test]
    fn selector_height_hint_targets_at_or_below() {
        let catalog = sample_catalog(&[1080, 720, 480, 360]);
        let selector = resolve_selector(QualityHint::Height(720), &catalog, 1080);
        assert_eq!(selector, FormatSelector::Video { max_height: 720 });
    }

    #[test]
    fn selector_absent_rung_falls_to_next_lower() {
        // 2160p not present — next-best available rung, not an error.
        let catalog = sample_catalog(&[1080, 720]);
        let selector = resolve_selector(QualityHint::Height(2160), &catalog, 1080);
        assert_eq!(selector, FormatSelector::Video { max_height: 1080 });
    }

    #[test]
    fn selector_hint_below_everything_picks_best_overall() {
        let catalog = sample_catalog(&[1080, 720]);
        let selector = resolve_selector(QualityHint::Height(144), &catalog, 1080);
        assert_eq!(selector, FormatSelector::Video { max_height: 1080 });
    }

    #[test]
    fn selector_best_caps_at_ceiling() {
        let catalog = sample_catalog(&[2160, 1080]);
        let selector = resolve_selector(QualityHint::Best, &catalog, 1080);
        assert_eq!(selector, FormatSelector::Video { max_height: 1080 });
    }

    #[test]
    fn selector_audio_only() {
        let catalog = sample_catalog(&[1080]);
        let selector = resolve_selector(QualityHint::Audio, &catalog, 1080);
        assert_eq!(selector, FormatSelector::AudioOnly);
    }

    #[test]
    fn selector_expressions() {
        assert_eq!(
            FormatSelector::Video { max_height: 720 }.expression(),
            "bestvideo[height<=720]+bestaudio/best[height<=720]"
        );
        assert_eq!(FormatSelector::AudioOnly.expression(), "bestaudio/best");
    }

    #[test]
    fn rung_inference_from_filenames() {
        assert_eq!(infer_rung_from_name("clip.f137.1080p.mp4"), Some("1080p"));
        assert_eq!(infer_rung_from_name("movie_2160p.webm"), Some("4K"));
        assert_eq!(infer_rung_from_name("talk-360p-part.mp4"), Some("360p"));
        assert_eq!(infer_rung_from_name("audio_only.m4a"), None);
    }

    #[test]
    fn rung_inference_prefers_highest_token() {
        // Pathological name carrying two tokens — highest-ranked wins.
        assert_eq!(infer_rung_from_name("a_2160p_then_720p.mp4"), Some("4K"));
    }

    #[test]
    fn metadata_deserializes_from_engine_json() {
        let json = r#"{
            "title": "A Talk",
            "duration": 123.4,
            "uploader": "chan",
            "formats": [
                {"format_id": "137", "ext": "mp4", "height": 1080, "vcodec": "avc1", "acodec": "none", "filesize": 1000},
                {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a"}
            ]
        }"#;
        let meta: MediaMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.formats.len(), 2);
        let catalog = QualityCatalog::from_metadata(&meta);
        assert_eq!(catalog.title, "A Talk");
        assert_eq!(catalog.rungs.len(), 1);
        assert!(catalog.has_audio);
    }
}
