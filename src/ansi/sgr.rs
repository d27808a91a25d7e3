//! SGR (Select Graphic Rendition) parameters: decoding and minimal deltas.

use super::attr::{Attr, Color, Rgb, Style};
use super::DecodeError;
use std::io::Write;

/// Style bits paired with their "on" and "off" SGR codes.
///
/// Bold and dim share the off code 22.
const STYLE_CODES: [(Style, u8, u8); 8] = [
    (Style::BOLD, 1, 22),
    (Style::DIM, 2, 22),
    (Style::ITALIC, 3, 23),
    (Style::UNDERLINE, 4, 24),
    (Style::BLINK, 5, 25),
    (Style::REVERSE, 7, 27),
    (Style::HIDDEN, 8, 28),
    (Style::STRIKE, 9, 29),
];

/// Apply the SGR parameter list `params` (the bytes between `CSI` and `m`)
/// to `base`.
///
/// Returns the merged attributes and the number of parameters consumed.
/// Both `;` and `:` separated extended colors are accepted. Unknown codes are
/// ignored; malformed numbers and out-of-range color components are errors.
pub fn decode_sgr(params: &[u8], base: Attr) -> Result<(Attr, usize), DecodeError> {
    let mut attr = base;
    let groups: Vec<&[u8]> = params.split(|&b| b == b';').collect();
    let mut i = 0;

    while i < groups.len() {
        let group = groups[i];
        if group.contains(&b':') {
            attr = apply_colon_group(attr, group, i)?;
            i += 1;
            continue;
        }

        let code = number(group, i)?;
        match code {
            38 | 48 | 58 => {
                let (color, used) = extended_color(&groups[i + 1..], i + 1)?;
                attr = set_color(attr, code, color);
                i += 1 + used;
                continue;
            }
            _ => attr = apply_code(attr, code),
        }
        i += 1;
    }

    Ok((attr, groups.len()))
}

/// Parse one numeric parameter; an empty parameter is zero.
fn number(param: &[u8], index: usize) -> Result<u32, DecodeError> {
    if param.is_empty() {
        return Ok(0);
    }
    std::str::from_utf8(param)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| DecodeError::sgr(index, param))
}

fn byte(param: &[u8], index: usize) -> Result<u8, DecodeError> {
    u8::try_from(number(param, index)?).map_err(|_| DecodeError::sgr(index, param))
}

/// Parse the `5;n` or `2;r;g;b` tail of a `;` separated extended color.
fn extended_color(rest: &[&[u8]], index: usize) -> Result<(Color, usize), DecodeError> {
    let missing = || DecodeError::sgr(index, b"");
    let kind = rest.first().ok_or_else(missing)?;
    match number(kind, index)? {
        5 => {
            let n = rest.get(1).ok_or_else(missing)?;
            Ok((Color::Ansi8(byte(n, index + 1)?), 2))
        }
        2 => {
            if rest.len() < 4 {
                return Err(DecodeError::sgr(index + rest.len(), b""));
            }
            let r = byte(rest[1], index + 1)?;
            let g = byte(rest[2], index + 2)?;
            let b = byte(rest[3], index + 3)?;
            Ok((Color::Rgb(Rgb::new(r, g, b)), 4))
        }
        _ => Err(DecodeError::sgr(index, kind)),
    }
}

/// Apply a `:` separated group such as `38:2::255:0:0` or `4:3`.
fn apply_colon_group(attr: Attr, group: &[u8], index: usize) -> Result<Attr, DecodeError> {
    let subs: Vec<&[u8]> = group.split(|&b| b == b':').collect();
    let code = number(subs[0], index)?;
    match code {
        38 | 48 | 58 => {
            let kind = subs.get(1).map_or(Ok(0), |k| number(k, index))?;
            let color = match (kind, subs.len()) {
                (5, 3) => Color::Ansi8(byte(subs[2], index)?),
                // With or without the color space identifier.
                (2, 5) => Color::Rgb(Rgb::new(
                    byte(subs[2], index)?,
                    byte(subs[3], index)?,
                    byte(subs[4], index)?,
                )),
                (2, 6) => Color::Rgb(Rgb::new(
                    byte(subs[3], index)?,
                    byte(subs[4], index)?,
                    byte(subs[5], index)?,
                )),
                _ => return Err(DecodeError::sgr(index, group)),
            };
            Ok(set_color(attr, code, color))
        }
        4 => {
            let style = subs.get(1).map_or(Ok(1), |s| number(s, index))?;
            Ok(if style == 0 {
                attr.remove_style(Style::UNDERLINE)
            } else {
                attr.add_style(Style::UNDERLINE)
            })
        }
        _ => Ok(apply_code(attr, code)),
    }
}

const fn set_color(attr: Attr, code: u32, color: Color) -> Attr {
    match code {
        38 => attr.with_fg(color),
        48 => attr.with_bg(color),
        // Underline color is not modeled.
        _ => attr,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn apply_code(attr: Attr, code: u32) -> Attr {
    match code {
        0 => Attr::DEFAULT,
        1 => attr.add_style(Style::BOLD),
        2 => attr.add_style(Style::DIM),
        3 => attr.add_style(Style::ITALIC),
        4 | 21 => attr.add_style(Style::UNDERLINE),
        5 | 6 => attr.add_style(Style::BLINK),
        7 => attr.add_style(Style::REVERSE),
        8 => attr.add_style(Style::HIDDEN),
        9 => attr.add_style(Style::STRIKE),
        22 => attr.remove_style(Style::BOLD | Style::DIM),
        23 => attr.remove_style(Style::ITALIC),
        24 => attr.remove_style(Style::UNDERLINE),
        25 => attr.remove_style(Style::BLINK),
        27 => attr.remove_style(Style::REVERSE),
        28 => attr.remove_style(Style::HIDDEN),
        29 => attr.remove_style(Style::STRIKE),
        30..=37 => attr.with_fg(Color::Ansi3((code - 30) as u8)),
        39 => attr.with_fg(Color::Default),
        40..=47 => attr.with_bg(Color::Ansi3((code - 40) as u8)),
        49 => attr.with_bg(Color::Default),
        90..=97 => attr.with_fg(Color::Ansi4((code - 90) as u8 + 8)),
        100..=107 => attr.with_bg(Color::Ansi4((code - 100) as u8 + 8)),
        _ => attr,
    }
}

/// Collects `;` separated SGR parameters.
#[derive(Default)]
struct Params(Vec<u8>);

impl Params {
    fn push(&mut self, n: u32) {
        if !self.0.is_empty() {
            self.0.push(b';');
        }
        let _ = write!(self.0, "{n}");
    }

    fn color(&mut self, base: u32, color: Color) {
        match color {
            Color::Default => self.push(base + 9),
            Color::Ansi3(n) => self.push(base + u32::from(n & 7)),
            Color::Ansi4(n) if n & 0x0F < 8 => self.push(base + u32::from(n & 7)),
            Color::Ansi4(n) => self.push(base + 60 + u32::from(n & 7)),
            Color::Ansi8(n) => {
                self.push(base + 8);
                self.push(5);
                self.push(u32::from(n));
            }
            Color::Rgb(rgb) => {
                self.push(base + 8);
                self.push(2);
                self.push(u32::from(rgb.r));
                self.push(u32::from(rgb.g));
                self.push(u32::from(rgb.b));
            }
        }
    }

    fn style_on(&mut self, style: Style) {
        for (bit, on, _) in STYLE_CODES {
            if style.contains(bit) {
                self.push(u32::from(on));
            }
        }
    }
}

/// Parameters that take `from` to `to` by switching individual codes off and on.
fn incremental(from: Attr, to: Attr) -> Params {
    let mut p = Params::default();
    let (old, new) = (from.text_style(), to.text_style());
    let removed = old - new;
    let mut added = new - old;

    let mut last_off = 0;
    for (bit, _, off) in STYLE_CODES {
        if removed.contains(bit) && off != last_off {
            p.push(u32::from(off));
            last_off = off;
        }
    }
    // 22 clears both bold and dim.
    if removed.intersects(Style::BOLD | Style::DIM) {
        added |= new & (Style::BOLD | Style::DIM);
    }
    p.style_on(added);

    if from.fg_color() != to.fg_color() {
        p.color(30, to.fg_color());
    }
    if from.bg_color() != to.bg_color() {
        p.color(40, to.bg_color());
    }
    p
}

/// Parameters that reset everything and then set `to`.
fn reset_then_set(to: Attr) -> Params {
    let mut p = Params::default();
    p.push(0);
    p.style_on(to.text_style());
    if to.fg_color() != Color::Default {
        p.color(30, to.fg_color());
    }
    if to.bg_color() != Color::Default {
        p.color(40, to.bg_color());
    }
    p
}

/// Write the shortest SGR sequence that changes the terminal's current
/// attributes from `from` to `to`. Writes nothing when they are equal.
pub fn write_sgr_delta(out: &mut Vec<u8>, from: Attr, to: Attr) {
    if from == to {
        return;
    }
    let params = if to.is_default() {
        Params(b"0".to_vec())
    } else {
        let inc = incremental(from, to);
        let reset = reset_then_set(to);
        if reset.0.len() < inc.0.len() {
            reset
        } else {
            inc
        }
    };
    out.extend_from_slice(b"\x1b[");
    out.extend_from_slice(&params.0);
    out.push(b'm');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(from: Attr, to: Attr) -> Vec<u8> {
        let mut out = Vec::new();
        write_sgr_delta(&mut out, from, to);
        out
    }

    #[test]
    fn test_decode_basic() {
        let (a, n) = decode_sgr(b"1;31;44", Attr::DEFAULT).unwrap();
        assert_eq!(n, 3);
        assert_eq!(a.text_style(), Style::BOLD);
        assert_eq!(a.fg_color(), Color::RED);
        assert_eq!(a.bg_color(), Color::BLUE);

        let (a, _) = decode_sgr(b"", a).unwrap();
        assert_eq!(a, Attr::DEFAULT);
    }

    #[test]
    fn test_decode_extended_colors() {
        let (a, _) = decode_sgr(b"38;5;196;48;2;1;2;3", Attr::DEFAULT).unwrap();
        assert_eq!(a.fg_color(), Color::Ansi8(196));
        assert_eq!(a.bg_color(), Color::Rgb(Rgb::new(1, 2, 3)));

        let (a, _) = decode_sgr(b"38:2::255:0:0", Attr::DEFAULT).unwrap();
        assert_eq!(a.fg_color(), Color::Rgb(Rgb::new(255, 0, 0)));
        let (a, _) = decode_sgr(b"48:5:17", Attr::DEFAULT).unwrap();
        assert_eq!(a.bg_color(), Color::Ansi8(17));
        let (a, _) = decode_sgr(b"97;101", Attr::DEFAULT).unwrap();
        assert_eq!(a.fg_color(), Color::Ansi4(15));
        assert_eq!(a.bg_color(), Color::Ansi4(9));
    }

    #[test]
    fn test_decode_errors_name_parameter() {
        assert_eq!(
            decode_sgr(b"1;x", Attr::DEFAULT),
            Err(DecodeError::Sgr {
                index: 1,
                param: "x".to_string()
            })
        );
        assert!(matches!(
            decode_sgr(b"38;5;300", Attr::DEFAULT),
            Err(DecodeError::Sgr { index: 2, .. })
        ));
        assert!(decode_sgr(b"38;2;1;2", Attr::DEFAULT).is_err());
        assert!(decode_sgr(b"38", Attr::DEFAULT).is_err());
    }

    #[test]
    fn test_delta_identical_is_empty() {
        let a = Attr::fg(Color::RED).with_style(Style::BOLD);
        assert!(delta(a, a).is_empty());
        assert!(delta(Attr::DEFAULT, Attr::DEFAULT).is_empty());
    }

    #[test]
    fn test_delta_minimal_forms() {
        let red = Attr::fg(Color::RED);
        assert_eq!(delta(Attr::DEFAULT, red), b"\x1b[31m");
        assert_eq!(delta(red, Attr::DEFAULT), b"\x1b[0m");
        assert_eq!(delta(red, Attr::fg(Color::Ansi4(9))), b"\x1b[91m");
        assert_eq!(
            delta(Attr::DEFAULT, Attr::bg(Color::Rgb(Rgb::new(1, 2, 3)))),
            b"\x1b[48;2;1;2;3m"
        );
    }

    #[test]
    fn test_delta_prefers_reset_when_shorter() {
        let from = Attr::style(Style::BOLD | Style::ITALIC | Style::UNDERLINE | Style::STRIKE);
        let to = Attr::style(Style::REVERSE);
        // "0;7" is shorter than "22;23;24;29;7".
        assert_eq!(delta(from, to), b"\x1b[0;7m");
    }

    #[test]
    fn test_delta_bold_dim_share_off_code() {
        let from = Attr::fg(Color::Ansi8(200)).with_style(Style::BOLD | Style::DIM);
        let to = from.with_style(Style::BOLD);
        assert_eq!(delta(from, to), b"\x1b[22;1m");
    }

    #[test]
    fn test_delta_round_trips_through_decode() {
        let a = Attr::fg(Color::Ansi8(100)).with_style(Style::ITALIC | Style::DIM);
        let b = Attr::bg(Color::GREEN).with_style(Style::BOLD);
        for (from, to) in [(a, b), (b, a), (Attr::DEFAULT, a), (b, Attr::DEFAULT)] {
            let bytes = delta(from, to);
            let params = &bytes[2..bytes.len() - 1];
            assert_eq!(decode_sgr(params, from).unwrap().0, to);
        }
    }
}
