//! Tests for M3U and M3U8 playlist loading

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::m3u_parser::*;
    use std::io::Write;

    const NEWS_AND_SPORTS: &str = r#"#EXTM3U
#EXTINF:-1 tvg-id="cnn.us" tvg-logo="http://logos/cnn.png" group-title="News",CNN International
http://example.com/live/cnn.m3u8
#EXTINF:-1 tvg-id="espn.us" group-title="Sports",ESPN
http://example.com/live/espn.m3u8
#EXTINF:-1 group-title="News",BBC World News
http://example.com/live/bbc.m3u8
#EXTINF:-1 group-title="news",Local news
http://example.com/live/local.m3u8
"#;

    fn loaded(content: &str) -> M3uParser {
        let mut parser = M3uParser::new();
        parser.parse_content(content).unwrap();
        parser
    }

    #[test]
    fn test_single_entry_fields() {
        let content = r#"#EXTM3U
#EXTINF:-1 tvg-id="ch1" tvg-logo="http://logos/1.png" group-title="Movies",Movie Channel
http://example.com/1.ts
"#;
        let parser = loaded(content);
        assert_eq!(parser.channels().len(), 1);

        let ch = &parser.channels()[0];
        assert_eq!(ch.name, "Movie Channel");
        assert_eq!(ch.url, "http://example.com/1.ts");
        assert_eq!(ch.group, "Movies");
        assert_eq!(ch.logo, "http://logos/1.png");
        assert_eq!(ch.tvg_id, "ch1");
        assert!(parser.groups().contains("Movies"));
    }

    #[test]
    fn test_missing_attributes_use_defaults() {
        let parser = loaded("#EXTM3U\n#EXTINF:-1\nhttp://example.com/bare.ts\n");
        let ch = &parser.channels()[0];
        assert_eq!(ch.name, "Unknown");
        assert_eq!(ch.group, "Unknown");
        assert!(ch.logo.is_empty());
        assert!(ch.tvg_id.is_empty());
        assert!(parser.groups().contains("Unknown"));
    }

    #[test]
    fn test_empty_group_title_becomes_unknown() {
        let parser =
            loaded("#EXTM3U\n#EXTINF:-1 group-title=\"\",Blank Group\nhttp://example.com/b.ts\n");
        assert_eq!(parser.channels()[0].group, "Unknown");
        assert!(parser.groups().contains("Unknown"));
        assert!(!parser.groups().contains(""));
    }

    #[test]
    fn test_positive_duration_and_no_attributes() {
        let parser = loaded("#EXTM3U\n#EXTINF:120,Radio One\nhttp://radio/1.mp3\n");
        assert_eq!(parser.channels()[0].name, "Radio One");
        assert_eq!(parser.channels()[0].group, "Unknown");
    }

    #[test]
    fn test_missing_header_fails_and_keeps_previous_state() {
        let mut parser = loaded(NEWS_AND_SPORTS);
        assert_eq!(parser.channels().len(), 4);

        let result = parser.parse_content("#EXTINF:-1,Orphan\nhttp://example.com/x.ts\n");
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
        assert_eq!(parser.channels().len(), 4);
        assert_eq!(parser.groups().len(), 3);
        assert_eq!(parser.channels()[0].name, "CNN International");
    }

    #[test]
    fn test_empty_input_is_invalid() {
        let mut parser = M3uParser::new();
        assert!(matches!(parser.parse_content(""), Err(Error::InvalidFormat(_))));
        assert!(matches!(parser.parse_content("\n  \n"), Err(Error::InvalidFormat(_))));
        assert!(parser.is_empty());
    }

    #[test]
    fn test_header_after_blank_lines() {
        let parser = loaded("\n\n   #EXTM3U\n#EXTINF:-1,A\nhttp://a\n");
        assert_eq!(parser.channels().len(), 1);
    }

    #[test]
    fn test_malformed_extinf_skips_its_url() {
        let content = r#"#EXTM3U
#EXTINF:abc group-title="Broken",Broken Channel
http://example.com/broken.ts
#EXTINF:-1 group-title="Fine",Fine Channel
http://example.com/fine.ts
"#;
        let parser = loaded(content);
        assert_eq!(parser.channels().len(), 1);
        assert_eq!(parser.channels()[0].name, "Fine Channel");
        assert!(!parser.groups().contains("Broken"));
    }

    #[test]
    fn test_url_without_extinf_is_ignored() {
        let content = r#"#EXTM3U
http://example.com/orphan.ts
#EXTINF:-1,Real
http://example.com/real.ts
http://example.com/second-url.ts
"#;
        let parser = loaded(content);
        assert_eq!(parser.channels().len(), 1);
        assert_eq!(parser.channels()[0].url, "http://example.com/real.ts");
    }

    #[test]
    fn test_directives_and_blank_lines_between_extinf_and_url() {
        let content = r#"#EXTM3U

#EXTINF:-1 group-title="Kids",Cartoons
#EXTVLCOPT:http-user-agent=Mozilla

#EXTGRP:Ignored
http://example.com/cartoons.ts
"#;
        let parser = loaded(content);
        assert_eq!(parser.channels().len(), 1);
        assert_eq!(parser.channels()[0].group, "Kids");
    }

    #[test]
    fn test_extinf_replaced_by_next_extinf() {
        let content = r#"#EXTM3U
#EXTINF:-1 group-title="First",First
#EXTINF:-1 group-title="Second",Second
http://example.com/2.ts
"#;
        let parser = loaded(content);
        assert_eq!(parser.channels().len(), 1);
        assert_eq!(parser.channels()[0].name, "Second");
        // Groups are collected as EXTINF lines are seen
        assert!(parser.groups().contains("First"));
        assert!(parser.groups().contains("Second"));
    }

    #[test]
    fn test_unknown_attributes_ignored() {
        let content = r#"#EXTM3U
#EXTINF:-1 tvg-name="Alt" tvg-chno="7" catchup="default" group-title="Docs",Nature
http://example.com/nature.ts
"#;
        let parser = loaded(content);
        assert_eq!(parser.channels()[0].name, "Nature");
        assert_eq!(parser.channels()[0].group, "Docs");
    }

    #[test]
    fn test_crlf_line_endings() {
        let parser = loaded("#EXTM3U\r\n#EXTINF:-1 group-title=\"G\",Win\r\nhttp://w/1.ts\r\n");
        assert_eq!(parser.channels()[0].name, "Win");
        assert_eq!(parser.channels()[0].url, "http://w/1.ts");
    }

    #[test]
    fn test_reload_replaces_instead_of_merging() {
        let mut parser = loaded(NEWS_AND_SPORTS);
        parser
            .parse_content("#EXTM3U\n#EXTINF:-1 group-title=\"Music\",MTV\nhttp://m/1.ts\n")
            .unwrap();
        assert_eq!(parser.channels().len(), 1);
        assert_eq!(parser.groups().iter().collect::<Vec<_>>(), vec!["Music"]);
    }

    #[test]
    fn test_search_is_case_insensitive_and_ordered() {
        let parser = loaded(NEWS_AND_SPORTS);
        let names: Vec<&str> = parser
            .search_channels("NEWS")
            .iter()
            .map(|ch| ch.name.as_str())
            .collect();
        assert_eq!(names, vec!["BBC World News", "Local news"]);
        assert_eq!(parser.search_channels("").len(), 4);
        assert!(parser.search_channels("zzz").is_empty());
    }

    #[test]
    fn test_group_filter_is_exact() {
        let parser = loaded(NEWS_AND_SPORTS);
        let names: Vec<&str> = parser
            .channels_by_group("News")
            .iter()
            .map(|ch| ch.name.as_str())
            .collect();
        assert_eq!(names, vec!["CNN International", "BBC World News"]);
        assert_eq!(parser.channels_by_group("news").len(), 1);
        assert!(parser.channels_by_group("Ne").is_empty());
    }

    #[test]
    fn test_groups_are_distinct() {
        let parser = loaded(NEWS_AND_SPORTS);
        let groups: Vec<&str> = parser.groups().iter().map(String::as_str).collect();
        assert_eq!(groups, vec!["News", "Sports", "news"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(NEWS_AND_SPORTS.as_bytes()).unwrap();

        let mut parser = M3uParser::new();
        assert_eq!(parser.load_from_file(file.path()).unwrap(), 4);
    }

    #[test]
    fn test_load_from_missing_file_keeps_state() {
        let mut parser = loaded(NEWS_AND_SPORTS);
        let dir = tempfile::tempdir().unwrap();
        let result = parser.load_from_file(dir.path().join("missing.m3u"));
        assert!(matches!(result, Err(Error::File { .. })));
        assert_eq!(parser.channels().len(), 4);
    }

    #[test]
    fn test_undecodable_bytes_keep_state() {
        let mut parser = loaded(NEWS_AND_SPORTS);
        let result = parser.load_from_bytes(&[0x1f, 0x8b, 0x08]);
        assert!(matches!(result, Err(Error::Decode(_))));
        assert_eq!(parser.channels().len(), 4);
        assert_eq!(parser.groups().len(), 3);
        assert_eq!(parser.channels()[0].name, "CNN International");
    }

    #[test]
    fn test_load_arabic_windows_1256_bytes() {
        let source = "#EXTM3U
#EXTINF:-1 group-title=\"أخبار\",قناة الجزيرة الإخبارية
http://example.com/aj.ts
#EXTINF:-1 group-title=\"رياضة\",قناة الرياضة العربية المباشرة
http://example.com/sport.ts
#EXTINF:-1 group-title=\"أفلام\",أفلام عربية كلاسيكية
http://example.com/movies.ts
";
        let (encoded, _, _) = encoding_rs::WINDOWS_1256.encode(source);

        let mut parser = M3uParser::new();
        parser.load_from_bytes(&encoded).unwrap();
        assert_eq!(parser.channels()[0].name, "قناة الجزيرة الإخبارية");
        assert_eq!(parser.channels()[0].group, "أخبار");
    }

    #[test]
    fn test_playlist_export_reads_back() {
        let parser = loaded(NEWS_AND_SPORTS);
        let mut playlist = crate::models::Playlist::new("Mine");
        for ch in parser.channels() {
            playlist.add_channel(ch.clone());
        }

        let reparsed = loaded(&playlist.to_m3u());
        assert_eq!(reparsed.channels(), parser.channels());
    }
}
