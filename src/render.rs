//! Renderers (C9): the default `info`/`search` layouts and the
//! printf-like custom format string.
use std::io::Write;

use crate::package::PackageRecord;
use crate::util::{human, CorralResult};

const INFO_INDENT: usize = 17;

/// Fixed-width labeled fields, one per attribute (§4.10). List-valued
/// fields wrap to `width - INFO_INDENT` and continue at the label column.
pub fn render_info(pkg: &PackageRecord, width: usize, installed: Option<&str>, out: &mut dyn Write) -> CorralResult<()> {
    writeln!(out, "Repository     : aur").map_err(io_err)?;
    write!(out, "Name           : {}", pkg.name).map_err(io_err)?;
    if let Some(local_version) = installed {
        let marker = if local_version != pkg.version { " [installed: out of date]" } else { " [installed]" };
        write!(out, "{}", marker).map_err(io_err)?;
    }
    writeln!(out).map_err(io_err)?;
    writeln!(out, "Version        : {}", pkg.version).map_err(io_err)?;
    writeln!(out, "URL            : {}", pkg.url).map_err(io_err)?;
    writeln!(out, "AUR Page       : https://aur.archlinux.org/packages/{}", pkg.name).map_err(io_err)?;

    write_list_field(out, "Provides", &pkg.provides, width)?;
    write_list_field(out, "Depends On", &pkg.depends, width)?;
    write_list_field(out, "Makedepends", &pkg.makedepends, width)?;

    if !pkg.optdepends.is_empty() {
        write!(out, "Optional Deps  : {}", pkg.optdepends[0]).map_err(io_err)?;
        writeln!(out).map_err(io_err)?;
        for dep in &pkg.optdepends[1..] {
            writeln!(out, "                 {}", dep).map_err(io_err)?;
        }
    }

    write_list_field(out, "Conflicts With", &pkg.conflicts, width)?;
    write_list_field(out, "Replaces", &pkg.replaces, width)?;

    writeln!(out, "Category       : {}", pkg.category_name()).map_err(io_err)?;
    writeln!(out, "Votes          : {}", pkg.num_votes).map_err(io_err)?;
    writeln!(out, "License        : {}", pkg.license).map_err(io_err)?;
    writeln!(out, "Out of Date    : {}", if pkg.out_of_date { "Yes" } else { "No" }).map_err(io_err)?;
    writeln!(out, "Maintainer     : {}", pkg.maintainer_display()).map_err(io_err)?;
    writeln!(out, "Submitted      : {}", pkg.first_submitted).map_err(io_err)?;
    writeln!(out, "Last Modified  : {}", pkg.last_modified).map_err(io_err)?;

    write_wrapped(out, "Description", &pkg.description, width)?;
    writeln!(out).map_err(io_err)?;
    Ok(())
}

fn write_list_field(out: &mut dyn Write, label: &str, values: &[String], width: usize) -> CorralResult<()> {
    write!(out, "{:<indent$}: ", label, indent = INFO_INDENT - 2).map_err(io_err)?;
    let budget = width.saturating_sub(INFO_INDENT);
    let mut column = 0usize;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            if budget > 0 && column + value.len() >= budget {
                writeln!(out).map_err(io_err)?;
                write!(out, "{:indent$}", "", indent = INFO_INDENT).map_err(io_err)?;
                column = 0;
            } else {
                write!(out, "  ").map_err(io_err)?;
            }
        }
        write!(out, "{}", value).map_err(io_err)?;
        column += value.len();
    }
    if values.is_empty() {
        write!(out, "None").map_err(io_err)?;
    }
    writeln!(out).map_err(io_err)?;
    Ok(())
}

fn write_wrapped(out: &mut dyn Write, label: &str, text: &str, width: usize) -> CorralResult<()> {
    write!(out, "{:<indent$}: ", label, indent = INFO_INDENT - 2).map_err(io_err)?;
    let budget = width.saturating_sub(INFO_INDENT);
    let mut column = 0usize;
    for (i, word) in text.split_whitespace().enumerate() {
        if i > 0 {
            if budget > 0 && column + 1 + word.len() > budget {
                writeln!(out).map_err(io_err)?;
                write!(out, "{:indent$}", "", indent = INFO_INDENT).map_err(io_err)?;
                column = 0;
            } else {
                write!(out, " ").map_err(io_err)?;
                column += 1;
            }
        }
        write!(out, "{}", word).map_err(io_err)?;
        column += word.len();
    }
    Ok(())
}

/// One line `repo/name ver (votes) [installed?]` plus an indented
/// description; in `quiet` mode just the name (§4.10).
pub fn render_search(pkg: &PackageRecord, quiet: bool, installed: Option<&str>, out: &mut dyn Write) -> CorralResult<()> {
    if quiet {
        return writeln!(out, "{}", pkg.name).map_err(io_err);
    }
    write!(out, "aur/{} {} ({})", pkg.name, pkg.version, pkg.num_votes).map_err(io_err)?;
    if pkg.out_of_date {
        write!(out, " [out of date]").map_err(io_err)?;
    }
    if installed.is_some() {
        write!(out, " [installed]").map_err(io_err)?;
    }
    writeln!(out).map_err(io_err)?;
    writeln!(out, "    {}", pkg.description).map_err(io_err)
}

fn io_err(e: std::io::Error) -> Box<dyn crate::util::CorralError> {
    human(format!("failed to write output: {}", e))
}

/// Escapes recognized in both the format string and the list delimiter
/// (§4.10): `\n \t \r \a \b \e \v \\ \"`.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('e') => out.push('\x1b'),
            Some('v') => out.push('\x0b'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn pad(value: &str, flags: &str) -> String {
    if flags.is_empty() {
        return value.to_string();
    }
    let left_align = flags.starts_with('-');
    let width: usize = flags.trim_start_matches('-').parse().unwrap_or(0);
    if value.len() >= width {
        return value.to_string();
    }
    let fill = " ".repeat(width - value.len());
    if left_align {
        format!("{}{}", value, fill)
    } else {
        format!("{}{}", fill, value)
    }
}

/// Render `format` (a printf-like template) against `pkg`, joining
/// list-valued placeholders with `list_delim`. Both `format` and
/// `list_delim` are unescaped first (§4.10).
pub fn render_custom_format(pkg: &PackageRecord, format: &str, list_delim: &str) -> String {
    let format = unescape(format);
    let list_delim = unescape(list_delim);
    let mut out = String::new();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let mut flags = String::new();
        while let Some(&next) = chars.peek() {
            if next == '-' || next.is_ascii_digit() {
                flags.push(next);
                chars.next();
            } else {
                break;
            }
        }
        let letter = match chars.next() {
            Some(letter) => letter,
            None => {
                out.push('%');
                break;
            }
        };
        let value = match letter {
            'a' => pkg.last_modified.to_string(),
            'c' => pkg.category_name().to_string(),
            'd' => pkg.description.clone(),
            'i' => pkg.id.to_string(),
            'l' => pkg.license.clone(),
            'm' => pkg.maintainer_display().to_string(),
            'n' => pkg.name.clone(),
            'o' => pkg.num_votes.to_string(),
            'p' => format!("https://aur.archlinux.org/packages/{}", pkg.name),
            's' => pkg.first_submitted.to_string(),
            't' => if pkg.out_of_date { "yes".to_string() } else { "no".to_string() },
            'u' => pkg.url.clone(),
            'v' => pkg.version.clone(),
            'C' => pkg.conflicts.join(&list_delim),
            'D' => pkg.depends.join(&list_delim),
            'M' => pkg.makedepends.join(&list_delim),
            'O' => pkg.optdepends.join(&list_delim),
            'P' => pkg.provides.join(&list_delim),
            'R' => pkg.replaces.join(&list_delim),
            '%' => "%".to_string(),
            _ => "?".to_string(),
        };
        out.push_str(&pad(&value, &flags));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg() -> PackageRecord {
        PackageRecord {
            id: 42,
            name: "foo".to_string(),
            version: "1.0-1".to_string(),
            category_id: 2,
            description: "a test package".to_string(),
            url: "https://example.com".to_string(),
            license: "MIT".to_string(),
            num_votes: 5,
            depends: vec!["glibc".to_string(), "zlib".to_string()],
            ..PackageRecord::default()
        }
    }

    #[test]
    fn custom_format_basic_fields() {
        let out = render_custom_format(&pkg(), "%n %v (%o)\\n", "  ");
        assert_eq!(out, "foo 1.0-1 (5)\n");
    }

    #[test]
    fn custom_format_list_join_and_literal_percent() {
        let out = render_custom_format(&pkg(), "%n: %D 100%%", ", ");
        assert_eq!(out, "foo: glibc, zlib 100%");
    }

    #[test]
    fn custom_format_width_padding() {
        let out = render_custom_format(&pkg(), "[%-10n]", " ");
        assert_eq!(out, "[foo       ]");
    }

    #[test]
    fn custom_format_unknown_letter_is_question_mark() {
        let out = render_custom_format(&pkg(), "%z", " ");
        assert_eq!(out, "?");
    }

    #[test]
    fn search_quiet_mode_prints_only_name() {
        let mut buf = Vec::new();
        render_search(&pkg(), true, None, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "foo\n");
    }
}
