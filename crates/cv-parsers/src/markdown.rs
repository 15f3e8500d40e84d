//! Markdown document parser: YAML-ish frontmatter, ATX headings, links
//! (markdown-syntax and bare URLs), heading-keyed sections, and cascading
//! document-type inference (frontmatter > filename > directory > content).

use cv_core::model::{DocFrontmatter, DocLink, DocSection, DocumentChunk, DocumentType, Heading, ParsedDocument};
use std::sync::OnceLock;

const DEFAULT_SECTION_LEVEL: u8 = 2;

pub fn parse_document(path: &str, content: &str) -> ParsedDocument {
    let (frontmatter, body, body_offset) = split_frontmatter(content);
    let headings = extract_headings(body, body_offset);
    let links = extract_links(body, body_offset);
    let inferred_type = infer_document_type(path, frontmatter.as_ref(), body);
    let sections = build_sections(content, &headings, &links, DEFAULT_SECTION_LEVEL);

    ParsedDocument {
        path: path.to_string(),
        frontmatter: frontmatter.unwrap_or_default(),
        headings,
        links,
        sections,
        inferred_type,
    }
}

pub fn chunk_document(doc: &ParsedDocument) -> Vec<DocumentChunk> {
    doc.sections
        .iter()
        .map(|section| DocumentChunk {
            id: format!("doc:{}:{}-{}", doc.path, section.start_line, section.end_line),
            file: doc.path.clone(),
            start_line: section.start_line,
            end_line: section.end_line,
            text: section.content.clone(),
            document_type: doc.inferred_type,
            tags: doc.frontmatter.tags.clone(),
        })
        .collect()
}

fn split_frontmatter(content: &str) -> (Option<DocFrontmatter>, &str, usize) {
    if !content.starts_with("---") {
        return (None, content, 0);
    }
    let mut lines = content.lines();
    lines.next(); // leading "---"
    let mut fm_lines = Vec::new();
    let mut consumed = 1usize;
    for line in lines {
        consumed += 1;
        if line.trim() == "---" {
            let rest_offset = content
                .lines()
                .take(consumed)
                .map(|l| l.len() + 1)
                .sum::<usize>();
            let body = &content[rest_offset.min(content.len())..];
            return (Some(parse_frontmatter(&fm_lines)), body, consumed);
        }
        fm_lines.push(line);
    }
    (None, content, 0)
}

fn parse_frontmatter(lines: &[&str]) -> DocFrontmatter {
    let mut fm = DocFrontmatter::default();
    for line in lines {
        let Some((key, value)) = line.split_once(':') else { continue };
        let key = key.trim();
        let value = unquote(value.trim());
        match key {
            "type" | "doc_type" => fm.doc_type = Some(value.to_string()),
            "status" => fm.status = Some(value.to_string()),
            "tags" => fm.tags = parse_inline_array(value),
            "relates_to" | "related" => fm.relates_to = parse_inline_array(value),
            "priority" => fm.priority = Some(value.to_string()),
            "author" => fm.author = Some(value.to_string()),
            "created" => fm.created = Some(value.to_string()),
            "updated" => fm.updated = Some(value.to_string()),
            "version" => fm.version = Some(value.to_string()),
            "" => {}
            other => {
                fm.custom_fields.insert(other.to_string(), value.to_string());
            }
        }
    }
    fm
}

fn unquote(s: &str) -> &str {
    s.trim_matches('"').trim_matches('\'')
}

fn parse_inline_array(value: &str) -> Vec<String> {
    let inner = value.trim().trim_start_matches('[').trim_end_matches(']');
    if inner.trim().is_empty() {
        return Vec::new();
    }
    inner
        .split(',')
        .map(|s| unquote(s.trim()).to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn heading_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").unwrap())
}

fn extract_headings(body: &str, line_offset: usize) -> Vec<Heading> {
    let re = heading_regex();
    body.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let caps = re.captures(line)?;
            let level = caps.get(1)?.as_str().len() as u8;
            let text = caps.get(2)?.as_str().to_string();
            let anchor = slugify(&text);
            Some(Heading {
                level,
                text,
                line: line_offset + idx + 1,
                anchor,
            })
        })
        .collect()
}

fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == ' ' || c == '-' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn link_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"\[([^\]]*)\]\(([^)]+)\)").unwrap())
}

fn bare_url_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"(?:^|[^(\[])(https?://[^\s)\]]+)").unwrap())
}

fn extract_links(body: &str, line_offset: usize) -> Vec<DocLink> {
    let mut links = Vec::new();
    for (idx, line) in body.lines().enumerate() {
        for caps in link_regex().captures_iter(line) {
            let text = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
            let target = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
            links.push(classify_link(text, target, line_offset + idx + 1));
        }
        for caps in bare_url_regex().captures_iter(line) {
            let Some(url) = caps.get(1) else { continue };
            let target = url.as_str().to_string();
            links.push(DocLink {
                text: target.clone(),
                target,
                line: line_offset + idx + 1,
                is_internal: false,
                is_code_ref: false,
            });
        }
    }
    links
}

fn classify_link(text: String, target: String, line: usize) -> DocLink {
    let is_internal = !target.starts_with("http://") && !target.starts_with("https://");
    let is_code_ref = is_internal
        && (target.contains(':')
            || target.ends_with(".rs")
            || target.ends_with(".py")
            || target.ends_with(".ts")
            || target.ends_with(".js")
            || target.ends_with(".go")
            || target.ends_with(".java"));
    DocLink {
        text,
        target,
        line,
        is_internal,
        is_code_ref,
    }
}

/// Groups the whole document's lines under each heading at or above
/// `section_level`, plus one leading section for content before the first
/// such heading.
fn build_sections(content: &str, headings: &[Heading], links: &[DocLink], section_level: u8) -> Vec<DocSection> {
    let lines: Vec<&str> = content.lines().collect();
    let boundaries: Vec<&Heading> = headings.iter().filter(|h| h.level <= section_level).collect();

    if boundaries.is_empty() {
        if lines.is_empty() {
            return Vec::new();
        }
        return vec![make_section(None, &lines, 1, lines.len(), links)];
    }

    let mut sections = Vec::new();
    if boundaries[0].line > 1 {
        sections.push(make_section(None, &lines, 1, boundaries[0].line - 1, links));
    }
    for (i, heading) in boundaries.iter().enumerate() {
        let end_line = boundaries.get(i + 1).map(|next| next.line - 1).unwrap_or(lines.len());
        sections.push(make_section(
            Some(heading.text.clone()),
            &lines,
            heading.line,
            end_line.max(heading.line),
            links,
        ));
    }
    sections
}

fn make_section(heading: Option<String>, lines: &[&str], start_line: usize, end_line: usize, all_links: &[DocLink]) -> DocSection {
    let start_idx = start_line.saturating_sub(1).min(lines.len());
    let end_idx = end_line.min(lines.len()).max(start_idx);
    let content = lines[start_idx..end_idx].join("\n");
    let links = all_links.iter().filter(|l| l.line >= start_line && l.line <= end_line).cloned().collect();
    DocSection {
        id: format!("doc:{start_line}-{end_line}"),
        heading,
        content,
        start_line,
        end_line,
        links,
    }
}

fn infer_document_type(path: &str, frontmatter: Option<&DocFrontmatter>, body: &str) -> DocumentType {
    if let Some(fm) = frontmatter {
        if let Some(t) = fm.doc_type.as_deref() {
            if let Some(parsed) = document_type_from_str(t) {
                return parsed;
            }
        }
    }

    let lower_path = path.to_lowercase();
    let file_name = lower_path.rsplit('/').next().unwrap_or(&lower_path);
    if let Some(t) = document_type_from_filename(file_name) {
        return t;
    }
    if let Some(t) = document_type_from_directory(&lower_path) {
        return t;
    }
    document_type_from_content(body)
}

fn document_type_from_str(s: &str) -> Option<DocumentType> {
    let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
    match normalized.as_str() {
        "readme" => Some(DocumentType::Readme),
        "changelog" => Some(DocumentType::Changelog),
        "adr" | "architecture_decision_record" => Some(DocumentType::Adr),
        "roadmap" => Some(DocumentType::Roadmap),
        "session_notes" => Some(DocumentType::SessionNotes),
        "phase_doc" => Some(DocumentType::PhaseDoc),
        "api_doc" | "api" => Some(DocumentType::ApiDoc),
        "release_note" | "release_notes" => Some(DocumentType::ReleaseNote),
        "guide" => Some(DocumentType::Guide),
        "tutorial" => Some(DocumentType::Tutorial),
        "reference" => Some(DocumentType::Reference),
        "design_spec" | "design" => Some(DocumentType::DesignSpec),
        "technical_spec" | "spec" | "specification" => Some(DocumentType::TechnicalSpec),
        _ => None,
    }
}

fn document_type_from_filename(file_name: &str) -> Option<DocumentType> {
    if file_name.starts_with("readme") {
        return Some(DocumentType::Readme);
    }
    if file_name.starts_with("changelog") || file_name == "history.md" {
        return Some(DocumentType::Changelog);
    }
    if file_name.contains("roadmap") {
        return Some(DocumentType::Roadmap);
    }
    None
}

fn document_type_from_directory(lower_path: &str) -> Option<DocumentType> {
    if lower_path.contains("/adr/") || lower_path.contains("/decisions/") {
        return Some(DocumentType::Adr);
    }
    if lower_path.contains("/sessions/") || lower_path.contains("/session-notes/") {
        return Some(DocumentType::SessionNotes);
    }
    if lower_path.contains("/phases/") {
        return Some(DocumentType::PhaseDoc);
    }
    if lower_path.contains("/api/") {
        return Some(DocumentType::ApiDoc);
    }
    if lower_path.contains("/tutorials/") {
        return Some(DocumentType::Tutorial);
    }
    if lower_path.contains("/guides/") {
        return Some(DocumentType::Guide);
    }
    if lower_path.contains("/reference/") {
        return Some(DocumentType::Reference);
    }
    if lower_path.contains("/specs/") || lower_path.contains("/spec/") {
        return Some(DocumentType::TechnicalSpec);
    }
    if lower_path.contains("/design/") {
        return Some(DocumentType::DesignSpec);
    }
    None
}

fn document_type_from_content(body: &str) -> DocumentType {
    let lower = body.to_lowercase();
    if lower.contains("## status") && (lower.contains("## decision") || lower.contains("## context")) {
        DocumentType::Adr
    } else if lower.contains("## endpoint") || (lower.contains("## request") && lower.contains("## response")) {
        DocumentType::ApiDoc
    } else if lower.starts_with("# changelog") || lower.contains("## [unreleased]") {
        DocumentType::Changelog
    } else {
        DocumentType::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frontmatter_and_headings() {
        let content = "---\ntype: guide\nstatus: active\ntags: [ops, oncall]\n---\n# Title\n\n## Steps\nDo a thing.\n";
        let doc = parse_document("docs/guides/deploy.md", content);
        assert_eq!(doc.inferred_type, DocumentType::Guide);
        assert_eq!(doc.frontmatter.status.as_deref(), Some("active"));
        assert_eq!(doc.frontmatter.tags, vec!["ops", "oncall"]);
        assert_eq!(doc.headings.len(), 2);
        assert_eq!(doc.headings[0].anchor, "title");
    }

    #[test]
    fn infers_readme_from_filename_without_frontmatter() {
        let doc = parse_document("README.md", "# Hello\nWorld\n");
        assert_eq!(doc.inferred_type, DocumentType::Readme);
    }

    #[test]
    fn extracts_markdown_and_bare_links() {
        let content = "# Doc\nSee [the code](src/lib.rs:10) and https://example.com/docs.\n";
        let doc = parse_document("notes.md", content);
        assert_eq!(doc.links.len(), 2);
        assert!(doc.links[0].is_code_ref);
        assert!(!doc.links[1].is_internal);
    }

    #[test]
    fn chunk_document_splits_by_heading() {
        let content = "# Top\nintro\n\n## One\nfirst\n\n## Two\nsecond\n";
        let doc = parse_document("d.md", content);
        let chunks = chunk_document(&doc);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text.contains("first"), true);
    }
}
