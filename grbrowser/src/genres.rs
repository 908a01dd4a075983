//! Static genre and curated-category tables

use crate::models::Genre;

/// Genre slug to upstream tag string
///
/// A tag string may hold several comma separated tags; it is forwarded as
/// a single `tag` parameter.
pub const GENRE_TAGS: &[(&str, &str)] = &[
    ("rock", "rock"),
    ("pop", "pop"),
    ("jazz", "jazz"),
    ("classical", "classical"),
    ("country", "country"),
    ("hip-hop", "hip hop,hiphop,rap"),
    ("electronic", "electronic,dance,techno,house"),
    ("blues", "blues"),
    ("reggae", "reggae"),
    ("folk", "folk"),
    ("metal", "metal"),
    ("punk", "punk"),
    ("alternative", "alternative"),
    ("indie", "indie"),
    ("soul", "soul,r&b"),
    ("funk", "funk"),
    ("latin", "latin,salsa,merengue"),
    ("world", "world music,ethnic"),
    ("ambient", "ambient,chillout"),
    ("news", "news,talk"),
    ("sports", "sports"),
    ("christian", "christian,gospel,religious"),
];

/// Curated genres served by `/api/genres`: (name, slug, icon)
pub const CURATED_GENRES: &[(&str, &str, &str)] = &[
    ("Rock", "rock", "🎸"),
    ("Pop", "pop", "🎵"),
    ("Jazz", "jazz", "🎺"),
    ("Classical", "classical", "🎼"),
    ("Country", "country", "🤠"),
    ("Hip-Hop", "hip-hop", "🎤"),
    ("Electronic", "electronic", "🎧"),
    ("Blues", "blues", "🎷"),
    ("Reggae", "reggae", "🌴"),
    ("Folk", "folk", "🪕"),
    ("Metal", "metal", "⚡"),
    ("Punk", "punk", "🤘"),
    ("Alternative", "alternative", "🎭"),
    ("Indie", "indie", "🎨"),
    ("Soul/R&B", "soul", "💫"),
    ("Latin", "latin", "💃"),
    ("World", "world", "🌍"),
    ("Ambient", "ambient", "🌙"),
    ("Christian", "christian", "✝️"),
    ("News/Talk", "news", "📰"),
    ("Sports", "sports", "⚽"),
];

/// Tags fanned out for the Christian curated category
pub const CHRISTIAN_TAGS: &[&str] = &[
    "christian",
    "gospel",
    "religious",
    "christian music",
    "christian rock",
    "christian pop",
];

/// Resolves a genre slug to its upstream tag string
///
/// Lookup is case-insensitive. Unknown slugs are returned verbatim.
pub fn genre_tags(slug: &str) -> &str {
    let lower = slug.to_lowercase();
    GENRE_TAGS
        .iter()
        .find(|(key, _)| *key == lower)
        .map(|(_, tags)| *tags)
        .unwrap_or(slug)
}

/// The curated genre list
pub fn curated_genres() -> Vec<Genre> {
    CURATED_GENRES
        .iter()
        .map(|(name, slug, icon)| Genre {
            name: name.to_string(),
            slug: slug.to_string(),
            icon: icon.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_genre() {
        assert_eq!(genre_tags("hip-hop"), "hip hop,hiphop,rap");
        assert_eq!(genre_tags("Hip-Hop"), "hip hop,hiphop,rap");
        assert_eq!(genre_tags("SOUL"), "soul,r&b");
    }

    #[test]
    fn test_unknown_genre_is_verbatim() {
        assert_eq!(genre_tags("Vaporwave"), "Vaporwave");
        assert_eq!(genre_tags(""), "");
    }

    #[test]
    fn test_every_curated_slug_maps_to_tags() {
        for (_, slug, _) in CURATED_GENRES {
            assert!(
                GENRE_TAGS.iter().any(|(key, _)| key == slug),
                "curated genre {} has no tag mapping",
                slug
            );
        }
    }

    #[test]
    fn test_curated_genres() {
        let genres = curated_genres();
        assert_eq!(genres.len(), 21);
        assert_eq!(genres[0].slug, "rock");
        assert_eq!(genres[14].name, "Soul/R&B");
    }
}
