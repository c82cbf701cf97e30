use crate::models::{Episode, Movie};

/// Case-insensitive substring filter over a composed searchable text
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    needle: Option<String>,
}

impl SearchFilter {
    /// An empty or missing query matches everything
    pub fn new(query: Option<&str>) -> Self {
        let needle = query
            .filter(|q| !q.is_empty())
            .map(|q| q.to_lowercase());
        Self { needle }
    }

    pub fn is_active(&self) -> bool {
        self.needle.is_some()
    }

    fn matches_parts(&self, parts: &[&str]) -> bool {
        match &self.needle {
            Some(needle) => parts.join(" ").to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }

    pub fn matches_movie(&self, movie: &Movie) -> bool {
        self.matches_parts(&[
            movie.custom_title.as_str(),
            movie.title.as_str(),
            movie.filename.as_str(),
        ])
    }

    /// `in_season_folder` adds "temporada N" to the searchable text
    pub fn matches_episode(&self, episode: &Episode, in_season_folder: bool) -> bool {
        if !self.is_active() {
            return true;
        }

        if in_season_folder {
            let season_label = format!("temporada {}", episode.season);
            self.matches_parts(&[
                episode.custom_title.as_str(),
                episode.title.as_str(),
                episode.filename.as_str(),
                episode.series.as_str(),
                season_label.as_str(),
            ])
        } else {
            self.matches_parts(&[
                episode.custom_title.as_str(),
                episode.title.as_str(),
                episode.filename.as_str(),
                episode.series.as_str(),
            ])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentKind;

    fn movie(custom_title: &str) -> Movie {
        Movie {
            kind: ContentKind::Movie,
            filename: "Inception.2010.mkv".to_string(),
            path: "/videos/movies/Inception.2010.mkv".to_string(),
            title: "Inception.2010".to_string(),
            custom_title: custom_title.to_string(),
            original_format: ".mkv".to_string(),
        }
    }

    fn episode(season: u32) -> Episode {
        Episode {
            kind: ContentKind::Episode,
            series: "Dark".to_string(),
            filename: "Dark.E01.mkv".to_string(),
            path: String::new(),
            title: "Dark.E01".to_string(),
            custom_title: "Secrets".to_string(),
            season,
            episode: 1,
            original_format: ".mkv".to_string(),
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(!SearchFilter::new(None).is_active());
        assert!(!SearchFilter::new(Some("")).is_active());
        assert!(SearchFilter::new(Some("")).matches_movie(&movie("x")));
    }

    #[test]
    fn test_movie_match_is_case_insensitive() {
        let filter = SearchFilter::new(Some("ORIGEM"));
        assert!(filter.matches_movie(&movie("A Origem")));
        assert!(!filter.matches_movie(&movie("Interstellar")));
        assert!(SearchFilter::new(Some("2010.MKV")).matches_movie(&movie("x")));
    }

    #[test]
    fn test_episode_matches_series_name() {
        let filter = SearchFilter::new(Some("dark"));
        assert!(filter.matches_episode(&episode(1), false));
    }

    #[test]
    fn test_season_label_only_in_season_folders() {
        let filter = SearchFilter::new(Some("temporada 2"));
        assert!(filter.matches_episode(&episode(2), true));
        assert!(!filter.matches_episode(&episode(2), false));
        assert!(!filter.matches_episode(&episode(3), true));
    }

    #[test]
    fn test_match_spans_joined_fields() {
        // Parts are joined with a space before matching
        let filter = SearchFilter::new(Some("secrets dark.e01"));
        assert!(filter.matches_episode(&episode(1), false));
    }
}
