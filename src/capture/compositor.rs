// Stream composition
//
// Merges tracks from independent captures into one logical stream. Encoders
// may assign channel roles by position, so the order is fixed: every video
// track, then system audio, then microphone audio.

use serde::{Deserialize, Serialize};

use super::backend::MediaTrack;

/// Where a track came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackRole {
    Video,
    SystemAudio,
    MicAudio,
}

/// A track tagged with its role in the composed stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub role: TrackRole,
    pub track: MediaTrack,
}

/// Ordered set of tracks fed to the encoder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrackSet {
    entries: Vec<TrackEntry>,
}

impl MediaTrackSet {
    pub fn entries(&self) -> &[TrackEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaTrack> {
        self.entries.iter().map(|entry| &entry.track)
    }

    pub fn roles(&self) -> Vec<TrackRole> {
        self.entries.iter().map(|entry| entry.role).collect()
    }

    pub fn with_role(&self, role: TrackRole) -> impl Iterator<Item = &MediaTrack> {
        self.entries
            .iter()
            .filter(move |entry| entry.role == role)
            .map(|entry| &entry.track)
    }

    pub fn has_video(&self) -> bool {
        self.entries.iter().any(|entry| entry.role == TrackRole::Video)
    }

    pub fn audio_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.role != TrackRole::Video)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Combine already-acquired tracks into one ordered set
pub fn compose(
    video: Vec<MediaTrack>,
    system_audio: Vec<MediaTrack>,
    mic_audio: Vec<MediaTrack>,
) -> MediaTrackSet {
    let mut entries = Vec::with_capacity(video.len() + system_audio.len() + mic_audio.len());

    let tagged = [
        (TrackRole::Video, video),
        (TrackRole::SystemAudio, system_audio),
        (TrackRole::MicAudio, mic_audio),
    ];

    for (role, tracks) in tagged {
        entries.extend(tracks.into_iter().map(|track| TrackEntry { role, track }));
    }

    MediaTrackSet { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::TrackKind;

    fn video(id: &str) -> MediaTrack {
        MediaTrack::new(id, TrackKind::Video, "screen")
    }

    fn audio(id: &str) -> MediaTrack {
        MediaTrack::new(id, TrackKind::Audio, "audio")
    }

    #[test]
    fn test_compose_orders_by_role() {
        let set = compose(vec![video("v1")], vec![audio("s1")], vec![audio("m1")]);

        let ids: Vec<&str> = set.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "s1", "m1"]);
        assert_eq!(
            set.roles(),
            vec![TrackRole::Video, TrackRole::SystemAudio, TrackRole::MicAudio]
        );
    }

    #[test]
    fn test_compose_keeps_acquisition_order_within_role() {
        let set = compose(
            vec![video("v2"), video("v1")],
            vec![],
            vec![audio("m2"), audio("m1")],
        );

        let ids: Vec<&str> = set.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["v2", "v1", "m2", "m1"]);
    }

    #[test]
    fn test_compose_does_not_deduplicate() {
        let set = compose(vec![video("v1")], vec![audio("a1")], vec![audio("a1")]);

        assert_eq!(set.len(), 3);
        assert_eq!(set.audio_count(), 2);
    }

    #[test]
    fn test_compose_empty() {
        let set = compose(vec![], vec![], vec![]);

        assert!(set.is_empty());
        assert!(!set.has_video());
    }

    #[test]
    fn test_with_role_filters() {
        let set = compose(vec![video("v1")], vec![audio("s1")], vec![audio("m1")]);

        let mic: Vec<&str> = set.with_role(TrackRole::MicAudio).map(|t| t.id.as_str()).collect();
        assert_eq!(mic, vec!["m1"]);
    }
}
