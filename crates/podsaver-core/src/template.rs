//! Filename rendering from percent-token templates.

use crate::track::TrackRecord;

/// Characters the filesystem refuses in names; each becomes `_`.
const INVALID_CHARS: [char; 8] = ['/', '|', ':', '*', '>', '<', '?', '"'];

/// Replace filesystem-hostile characters in a rendered value.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Render a destination name from a `%`-token template.
///
/// `%a` artist, `%A` album, `%t` title, `%y` year, `%n` track number,
/// `%N` track number zero-padded to two digits, `%g` genre. Unset fields
/// render as the empty string. Token values are sanitized before insertion;
/// literal template text is kept as typed, so path separators in the
/// template request subdirectories.
pub fn render(template: &str, track: &TrackRecord) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('a') => {
                chars.next();
                push_field(&mut out, track.artist.as_deref());
            }
            Some('A') => {
                chars.next();
                push_field(&mut out, track.album.as_deref());
            }
            Some('t') => {
                chars.next();
                push_field(&mut out, track.title.as_deref());
            }
            Some('g') => {
                chars.next();
                push_field(&mut out, track.genre.as_deref());
            }
            Some('y') => {
                chars.next();
                out.push_str(&track.year.to_string());
            }
            Some('n') => {
                chars.next();
                out.push_str(&track.track_id.to_string());
            }
            Some('N') => {
                chars.next();
                out.push_str(&format!("{:02}", track.track_id));
            }
            // A bare or unrecognized `%` is literal text.
            _ => out.push('%'),
        }
    }
    out
}

fn push_field(out: &mut String, value: Option<&str>) {
    if let Some(v) = value {
        out.push_str(&sanitize(v));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackKind;

    fn track() -> TrackRecord {
        let mut t = TrackRecord::new(TrackKind::Audio, 7);
        t.year = 2004;
        t.title = Some("Song".to_string());
        t.artist = Some("Band".to_string());
        t.album = Some("Album".to_string());
        t.genre = Some("Rock".to_string());
        t
    }

    #[test]
    fn test_plain_name_is_untouched() {
        assert_eq!(render("plainname.mp3", &track()), "plainname.mp3");
    }

    #[test]
    fn test_all_tokens() {
        assert_eq!(
            render("%n %N %a %A %t %y %g", &track()),
            "7 07 Band Album Song 2004 Rock"
        );
    }

    #[test]
    fn test_track_number_padding() {
        let mut t = track();
        assert_eq!(render("%n", &t), "7");
        assert_eq!(render("%N", &t), "07");
        t.track_id = 12;
        assert_eq!(render("%n", &t), "12");
        assert_eq!(render("%N", &t), "12");
    }

    #[test]
    fn test_unset_fields_render_empty() {
        let t = TrackRecord::new(TrackKind::Audio, 1);
        assert_eq!(render("[%a][%A][%t][%g]", &t), "[][][][]");
    }

    #[test]
    fn test_sanitize_removes_all_forbidden_chars() {
        assert_eq!(sanitize("a/b|c:d*e>f<g?h\"i"), "a_b_c_d_e_f_g_h_i");
    }

    #[test]
    fn test_field_values_are_sanitized_but_template_separators_kept() {
        let mut t = track();
        t.artist = Some("AC/DC".to_string());
        assert_eq!(render("%a/%t", &t), "AC_DC/Song");
    }

    #[test]
    fn test_unrecognized_token_is_literal() {
        assert_eq!(render("100%z", &track()), "100%z");
        assert_eq!(render("100%", &track()), "100%");
    }
}
