use std::collections::HashMap;
use std::io::Read;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use themedhl_highlight::{
    parse_brush, parse_underline, split_extensions, BrushParseError, ColorBrush, FontStyle,
    FontWeight,
};
use tracing::debug;

use crate::document::{
    ColorDecl, GlobalStyleDecl, PropertyDecl, SyntaxColorSetDecl, ThemeDocument, ThemeElement,
    THEME_NAMESPACE,
};
use crate::error::{FormatError, TextPosition};
use crate::global_style::GlobalStyleKind;

const ROOT: &str = "ThemeSyntaxDefinition";
const SYNTAX_DEFINITION: &str = "SyntaxDefinition";
const COLOR: &str = "Color";
const PROPERTY: &str = "Property";
const GLOBAL_STYLES: &str = "GlobalStyles";

const ROOT_ATTRIBUTES: &[&str] = &["name"];
const SYNTAX_DEFINITION_ATTRIBUTES: &[&str] = &["name", "extensions"];
const COLOR_ATTRIBUTES: &[&str] = &[
    "name",
    "foreground",
    "background",
    "fontWeight",
    "fontStyle",
    "underline",
    "exampleText",
];
const PROPERTY_ATTRIBUTES: &[&str] = &["name", "value"];
const GLOBAL_STYLE_ATTRIBUTES: &[&str] = &["foreground", "background", "border"];

/// Reads overlay markup into a [`ThemeDocument`].
///
/// With `validate_schema` set, required attributes, unknown attributes, stray
/// text and global style names are checked as well; without it only the
/// structural rules apply.
pub struct ThemeDocumentParser;

impl ThemeDocumentParser {
    pub fn parse(input: &[u8], validate_schema: bool) -> Result<ThemeDocument, FormatError> {
        let document = DocumentReader::new(input, validate_schema).read_document()?;
        debug!(
            theme = %document.name,
            elements = document.elements.len(),
            "parsed theme overlay"
        );
        Ok(document)
    }

    pub fn parse_str(input: &str, validate_schema: bool) -> Result<ThemeDocument, FormatError> {
        Self::parse(input.as_bytes(), validate_schema)
    }

    pub fn parse_reader(
        mut reader: impl Read,
        validate_schema: bool,
    ) -> Result<ThemeDocument, FormatError> {
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .map_err(|err| FormatError::new(format!("failed to read overlay: {err}")))?;
        Self::parse(&buffer, validate_schema)
    }
}

/// Byte offset to line/column translation.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(input: &[u8]) -> Self {
        let mut starts = vec![0];
        for (offset, byte) in input.iter().enumerate() {
            if *byte == b'\n' {
                starts.push(offset + 1);
            }
        }
        Self { starts }
    }

    fn position(&self, offset: usize) -> TextPosition {
        let line = match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        TextPosition::new(line + 1, offset - self.starts[line] + 1)
    }
}

struct Element<'i> {
    start: BytesStart<'i>,
    has_children: bool,
    position: TextPosition,
}

impl Element<'_> {
    fn local_name(&self) -> String {
        String::from_utf8_lossy(self.start.local_name().as_ref()).into_owned()
    }

    fn error(&self, message: impl Into<String>) -> FormatError {
        FormatError::at(Some(self.position), message)
    }
}

struct DocumentReader<'i> {
    input: &'i [u8],
    reader: NsReader<&'i [u8]>,
    lines: LineIndex,
    validate_schema: bool,
}

impl<'i> DocumentReader<'i> {
    fn new(input: &'i [u8], validate_schema: bool) -> Self {
        Self {
            input,
            reader: NsReader::from_reader(input),
            lines: LineIndex::new(input),
            validate_schema,
        }
    }

    fn read_document(mut self) -> Result<ThemeDocument, FormatError> {
        loop {
            let (themed, event, position) = self.next_event()?;
            match event {
                Event::Start(start) => {
                    let root = Element {
                        start,
                        has_children: true,
                        position,
                    };
                    return self.read_root(themed, root);
                }
                Event::Empty(start) => {
                    let root = Element {
                        start,
                        has_children: false,
                        position,
                    };
                    return self.read_root(themed, root);
                }
                Event::Text(text) => {
                    if !is_blank(&text) {
                        return Err(FormatError::at(
                            Some(position),
                            "Text is not allowed before the root element",
                        ));
                    }
                }
                Event::Eof => {
                    return Err(FormatError::at(
                        Some(position),
                        format!("Document has no {ROOT} root element"),
                    ));
                }
                _ => {}
            }
        }
    }

    fn read_root(&mut self, themed: bool, root: Element<'i>) -> Result<ThemeDocument, FormatError> {
        let local_name = root.local_name();
        if !themed || local_name != ROOT {
            return Err(root.error(format!(
                "Expected {ROOT} in namespace '{THEME_NAMESPACE}', found {local_name}"
            )));
        }
        let mut attributes = self.attributes(&root, ROOT_ATTRIBUTES)?;
        let name = self.required(&root, &mut attributes, "name")?;
        let mut document = ThemeDocument::new(name);

        if !root.has_children {
            return Ok(document);
        }
        while let Some(child) = self.next_child(ROOT)? {
            match child.local_name().as_str() {
                SYNTAX_DEFINITION => {
                    let decl = self.read_syntax_definition(child)?;
                    document.elements.push(ThemeElement::SyntaxColorSet(decl));
                }
                PROPERTY => {
                    let decl = self.read_property(child)?;
                    document.elements.push(ThemeElement::Property(decl));
                }
                GLOBAL_STYLES => {
                    for decl in self.read_global_styles(child)? {
                        document.elements.push(ThemeElement::GlobalStyle(decl));
                    }
                }
                COLOR => {
                    return Err(child.error("Color cannot occur outside of SyntaxDefinition"));
                }
                other => return Err(child.error(format!("Unknown element {other}"))),
            }
        }
        Ok(document)
    }

    fn read_syntax_definition(
        &mut self,
        element: Element<'i>,
    ) -> Result<SyntaxColorSetDecl, FormatError> {
        let mut attributes = self.attributes(&element, SYNTAX_DEFINITION_ATTRIBUTES)?;
        let mut decl = SyntaxColorSetDecl::new(self.required(&element, &mut attributes, "name")?);
        decl.extensions = attributes
            .remove("extensions")
            .map(|value| split_extensions(&value))
            .unwrap_or_default();
        decl.position = Some(element.position);

        if element.has_children {
            while let Some(child) = self.next_child(SYNTAX_DEFINITION)? {
                match child.local_name().as_str() {
                    COLOR => decl.colors.push(self.read_color(child)?),
                    nested @ (ROOT | SYNTAX_DEFINITION | PROPERTY | GLOBAL_STYLES) => {
                        return Err(child.error(format!(
                            "{nested} cannot occur inside {SYNTAX_DEFINITION}"
                        )));
                    }
                    other => return Err(child.error(format!("Unknown element {other}"))),
                }
            }
        }
        Ok(decl)
    }

    fn read_color(&mut self, element: Element<'i>) -> Result<ColorDecl, FormatError> {
        let mut attributes = self.attributes(&element, COLOR_ATTRIBUTES)?;
        let name = attributes.remove("name").unwrap_or_default();
        check_element_name(&element, &name)?;

        let decl = ColorDecl {
            foreground: brush_attribute(&element, attributes.remove("foreground"))?,
            background: brush_attribute(&element, attributes.remove("background"))?,
            underline: non_empty(attributes.remove("underline"))
                .map(|value| parse_underline(&value))
                .transpose()
                .map_err(|err| element.error(err.to_string()))?,
            font_weight: non_empty(attributes.remove("fontWeight"))
                .map(|value| value.parse::<FontWeight>())
                .transpose()
                .map_err(|err| element.error(err.to_string()))?,
            font_style: non_empty(attributes.remove("fontStyle"))
                .map(|value| value.parse::<FontStyle>())
                .transpose()
                .map_err(|err| element.error(err.to_string()))?,
            example_text: attributes.remove("exampleText"),
            position: Some(element.position),
            name,
        };
        self.expect_leaf(&element, COLOR)?;
        Ok(decl)
    }

    fn read_property(&mut self, element: Element<'i>) -> Result<PropertyDecl, FormatError> {
        let mut attributes = self.attributes(&element, PROPERTY_ATTRIBUTES)?;
        let name = self.required(&element, &mut attributes, "name")?;
        let value = attributes.remove("value").unwrap_or_default();
        self.expect_leaf(&element, PROPERTY)?;
        Ok(PropertyDecl {
            name,
            value,
            position: Some(element.position),
        })
    }

    fn read_global_styles(
        &mut self,
        element: Element<'i>,
    ) -> Result<Vec<GlobalStyleDecl>, FormatError> {
        self.attributes(&element, &[])?;
        let mut styles = Vec::new();
        if !element.has_children {
            return Ok(styles);
        }
        while let Some(child) = self.next_child(GLOBAL_STYLES)? {
            let type_name = child.local_name();
            if self.validate_schema && GlobalStyleKind::from_name(&type_name).is_none() {
                return Err(child.error(format!("GlobalStyle named '{type_name}' is not supported")));
            }
            let mut attributes = self.attributes(&child, GLOBAL_STYLE_ATTRIBUTES)?;
            let decl = GlobalStyleDecl {
                foreground: brush_attribute(&child, attributes.remove("foreground"))?,
                background: brush_attribute(&child, attributes.remove("background"))?,
                border: brush_attribute(&child, attributes.remove("border"))?,
                position: Some(child.position),
                type_name,
            };
            self.expect_leaf(&child, &decl.type_name)?;
            styles.push(decl);
        }
        Ok(styles)
    }

    /// Position of the markup that starts at `offset`, snapped back onto a
    /// `<` the reader has already consumed.
    fn position_at(&self, offset: usize) -> TextPosition {
        let opener = match offset.checked_sub(1) {
            Some(previous) if self.input.get(offset) != Some(&b'<') && self.input[previous] == b'<' => {
                previous
            }
            _ => offset,
        };
        self.lines.position(opener)
    }

    fn next_event(&mut self) -> Result<(bool, Event<'i>, TextPosition), FormatError> {
        let position = self.position_at(self.reader.buffer_position());
        let (resolved, event) = self
            .reader
            .read_resolved_event()
            .map_err(|err| FormatError::at(Some(position), err.to_string()))?;
        let themed = match resolved {
            ResolveResult::Bound(Namespace(namespace)) => namespace == THEME_NAMESPACE.as_bytes(),
            _ => false,
        };
        Ok((themed, event, position))
    }

    /// Next child element in the overlay namespace, or `None` at the parent's
    /// end tag. Foreign elements are skipped together with their content.
    fn next_child(&mut self, parent: &str) -> Result<Option<Element<'i>>, FormatError> {
        loop {
            let (themed, event, position) = self.next_event()?;
            match event {
                Event::Start(start) => {
                    if themed {
                        return Ok(Some(Element {
                            start,
                            has_children: true,
                            position,
                        }));
                    }
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    self.skip_subtree(&name)?;
                }
                Event::Empty(start) => {
                    if themed {
                        return Ok(Some(Element {
                            start,
                            has_children: false,
                            position,
                        }));
                    }
                }
                Event::End(_) => return Ok(None),
                Event::Text(text) => {
                    if self.validate_schema && !is_blank(&text) {
                        return Err(FormatError::at(
                            Some(position),
                            format!("Text content is not allowed inside {parent}"),
                        ));
                    }
                }
                Event::CData(_) => {
                    if self.validate_schema {
                        return Err(FormatError::at(
                            Some(position),
                            format!("Text content is not allowed inside {parent}"),
                        ));
                    }
                }
                Event::Eof => {
                    return Err(FormatError::at(
                        Some(position),
                        format!("Unexpected end of document inside {parent}"),
                    ));
                }
                _ => {}
            }
        }
    }

    /// Consumes a foreign element's content up to its end tag. Every event
    /// goes through the resolver so namespace scopes stay balanced.
    fn skip_subtree(&mut self, name: &str) -> Result<(), FormatError> {
        let mut depth = 1usize;
        while depth > 0 {
            let (_, event, position) = self.next_event()?;
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth -= 1,
                Event::Eof => {
                    return Err(FormatError::at(
                        Some(position),
                        format!("Unexpected end of document inside {name}"),
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn expect_leaf(&mut self, element: &Element<'i>, name: &str) -> Result<(), FormatError> {
        if !element.has_children {
            return Ok(());
        }
        if let Some(child) = self.next_child(name)? {
            return Err(child.error(format!("{name} cannot contain child elements")));
        }
        Ok(())
    }

    /// Unprefixed attribute values of `element`, unescaped.
    fn attributes(
        &self,
        element: &Element<'i>,
        allowed: &[&str],
    ) -> Result<HashMap<String, String>, FormatError> {
        let mut values = HashMap::new();
        for attribute in element.start.attributes() {
            let attribute = attribute.map_err(|err| element.error(err.to_string()))?;
            let key = attribute.key;
            if key.as_namespace_binding().is_some() || key.prefix().is_some() {
                continue;
            }
            let name = String::from_utf8_lossy(key.local_name().as_ref()).into_owned();
            if !allowed.contains(&name.as_str()) {
                if self.validate_schema {
                    return Err(element.error(format!(
                        "Unknown attribute '{name}' on {}",
                        element.local_name()
                    )));
                }
                continue;
            }
            let raw = self
                .reader
                .decoder()
                .decode(&attribute.value)
                .map_err(|err| element.error(err.to_string()))?;
            let value = quick_xml::escape::unescape(&raw)
                .map_err(|err| element.error(err.to_string()))?
                .into_owned();
            values.insert(name, value);
        }
        Ok(values)
    }

    /// A missing attribute is an error when validating and empty otherwise.
    fn required(
        &self,
        element: &Element<'i>,
        attributes: &mut HashMap<String, String>,
        name: &str,
    ) -> Result<String, FormatError> {
        match attributes.remove(name) {
            Some(value) => Ok(value),
            None if self.validate_schema => Err(element.error(format!(
                "{} requires a '{name}' attribute",
                element.local_name()
            ))),
            None => Ok(String::new()),
        }
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn check_element_name(element: &Element<'_>, name: &str) -> Result<(), FormatError> {
    if name.is_empty() {
        return Err(element.error("The empty string is not a valid name"));
    }
    if name.contains('/') {
        return Err(element.error(format!("Element names must not contain a slash: '{name}'")));
    }
    Ok(())
}

fn brush_attribute(
    element: &Element<'_>,
    value: Option<String>,
) -> Result<Option<ColorBrush>, FormatError> {
    let Some(value) = non_empty(value) else {
        return Ok(None);
    };
    match parse_brush(&value) {
        Ok(brush) => Ok(Some(brush)),
        Err(err @ BrushParseError::UnknownReference(_)) => Err(element.error(err.to_string())),
        Err(BrushParseError::Color(reason)) => {
            Err(element.error(format!("Invalid color '{value}': {reason}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use themedhl_highlight::{Color, SystemColor};

    fn themed(body: &str) -> String {
        format!(
            r#"<ThemeSyntaxDefinition name="Dark" xmlns="{THEME_NAMESPACE}">{body}</ThemeSyntaxDefinition>"#
        )
    }

    #[test]
    fn reads_syntax_definitions_with_colors() {
        let xml = themed(
            r##"<SyntaxDefinition name="C#" extensions=".cs;.csx">
                  <Color name="Comment" foreground="#57A64A" fontStyle="Italic" exampleText="// hi" />
                  <Color name="Keyword" foreground="SystemColors.HotTrack" fontWeight="bold" underline="false" />
                </SyntaxDefinition>"##,
        );
        let document = ThemeDocumentParser::parse_str(&xml, true).unwrap();
        assert_eq!(document.name, "Dark");

        let set = document.syntax_color_sets().next().unwrap();
        assert_eq!(set.name, "C#");
        assert_eq!(set.extensions, vec![".cs".to_string(), ".csx".to_string()]);
        assert_eq!(set.colors.len(), 2);

        let comment = &set.colors[0];
        assert_eq!(
            comment.foreground,
            Some(ColorBrush::Fixed(Color::rgb(0x57, 0xA6, 0x4A)))
        );
        assert_eq!(comment.font_style, Some(FontStyle::Italic));
        assert_eq!(comment.example_text.as_deref(), Some("// hi"));
        assert!(comment.background.is_none());
        assert!(comment.underline.is_none());

        let keyword = &set.colors[1];
        assert_eq!(
            keyword.foreground,
            Some(ColorBrush::System(SystemColor::HotTrack))
        );
        assert_eq!(keyword.font_weight, Some(FontWeight::Bold));
        assert_eq!(keyword.underline, Some(false));
    }

    #[test]
    fn records_line_and_column() {
        let xml = format!(
            "<ThemeSyntaxDefinition name=\"Dark\" xmlns=\"{THEME_NAMESPACE}\">\n  <SyntaxDefinition name=\"XML\">\n    <Color name=\"Tag\" />\n  </SyntaxDefinition>\n</ThemeSyntaxDefinition>"
        );
        let document = ThemeDocumentParser::parse_str(&xml, true).unwrap();
        let set = document.syntax_color_sets().next().unwrap();
        assert_eq!(set.position, Some(TextPosition::new(2, 3)));
        assert_eq!(set.colors[0].position, Some(TextPosition::new(3, 5)));
    }

    #[test]
    fn unknown_element_in_namespace_fails() {
        let xml = themed(r#"<Palette name="x" />"#);
        let err = ThemeDocumentParser::parse_str(&xml, false).unwrap_err();
        assert!(err.message.contains("Unknown element Palette"), "{err}");
        assert!(err.position.is_some());
    }

    #[test]
    fn foreign_namespace_subtrees_are_skipped() {
        let xml = themed(
            r#"<ext:Notes xmlns:ext="urn:example:notes"><ext:Color name="ignored" /><Unrelated /></ext:Notes>
               <meta xmlns="urn:example:meta" />"#,
        );
        let document = ThemeDocumentParser::parse_str(&xml, true).unwrap();
        assert!(document.elements.is_empty());
    }

    #[test]
    fn content_after_a_foreign_default_namespace_is_kept() {
        let xml = themed(
            r##"<meta xmlns="urn:example:meta"><inner><deeper /></inner><inner /></meta>
               <SyntaxDefinition name="C#"><Color name="Comment" foreground="#57A64A" /></SyntaxDefinition>"##,
        );
        let document = ThemeDocumentParser::parse_str(&xml, true).unwrap();
        let sets: Vec<_> = document.syntax_color_sets().collect();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, "C#");
        assert_eq!(
            sets[0].colors[0].foreground,
            Some(ColorBrush::Fixed(Color::rgb(0x57, 0xA6, 0x4A)))
        );
    }

    #[test]
    fn unclosed_foreign_subtree_is_a_format_error() {
        let xml = format!(
            r#"<ThemeSyntaxDefinition name="Dark" xmlns="{THEME_NAMESPACE}"><meta xmlns="urn:example:meta"><inner>"#
        );
        let err = ThemeDocumentParser::parse_str(&xml, false).unwrap_err();
        assert_eq!(err.message, "Unexpected end of document inside meta");
    }

    #[test]
    fn color_outside_syntax_definition_fails() {
        let xml = themed(r#"<Color name="Comment" />"#);
        let err = ThemeDocumentParser::parse_str(&xml, false).unwrap_err();
        assert_eq!(err.message, "Color cannot occur outside of SyntaxDefinition");
    }

    #[test]
    fn color_names_must_be_present_and_slash_free() {
        for body in [
            r#"<SyntaxDefinition name="C#"><Color foreground="Red" /></SyntaxDefinition>"#,
            r#"<SyntaxDefinition name="C#"><Color name="" /></SyntaxDefinition>"#,
            r#"<SyntaxDefinition name="C#"><Color name="a/b" /></SyntaxDefinition>"#,
        ] {
            assert!(ThemeDocumentParser::parse_str(&themed(body), false).is_err());
        }
    }

    #[test]
    fn unknown_system_color_reference_fails() {
        let xml = themed(
            r#"<SyntaxDefinition name="C#"><Color name="Comment" foreground="SystemColors.Nope" /></SyntaxDefinition>"#,
        );
        let err = ThemeDocumentParser::parse_str(&xml, false).unwrap_err();
        assert_eq!(err.message, "Cannot find 'SystemColors.Nope'");
    }

    #[test]
    fn schema_validation_is_opt_in() {
        let xml = themed(
            r#"<SyntaxDefinition name="C#" flavour="spicy">stray<Color name="Comment" /></SyntaxDefinition>"#,
        );
        assert!(ThemeDocumentParser::parse_str(&xml, true).is_err());
        let document = ThemeDocumentParser::parse_str(&xml, false).unwrap();
        assert_eq!(document.syntax_color_sets().count(), 1);
    }

    #[test]
    fn reads_properties_and_global_styles() {
        let xml = themed(
            r##"<Property name="Author" value="ThemedHL &amp; friends" />
                <GlobalStyles>
                  <DefaultStyle foreground="#DCDCDC" background="#1E1E1E" />
                  <Selection background="#264F78" />
                </GlobalStyles>"##,
        );
        let document = ThemeDocumentParser::parse_str(&xml, true).unwrap();
        let property = document.properties().next().unwrap();
        assert_eq!(property.name, "Author");
        assert_eq!(property.value, "ThemedHL & friends");

        let styles: Vec<_> = document.global_styles().collect();
        assert_eq!(styles.len(), 2);
        assert_eq!(styles[0].type_name, "DefaultStyle");
        assert_eq!(
            styles[1].background,
            Some(ColorBrush::Fixed(Color::rgb(0x26, 0x4F, 0x78)))
        );
        assert!(styles[1].border.is_none());
    }

    #[test]
    fn unknown_global_style_is_schema_error_only() {
        let xml = themed(r#"<GlobalStyles><Gutter background="Black" /></GlobalStyles>"#);
        assert!(ThemeDocumentParser::parse_str(&xml, true).is_err());
        let document = ThemeDocumentParser::parse_str(&xml, false).unwrap();
        assert_eq!(document.global_styles().next().unwrap().type_name, "Gutter");
    }

    #[test]
    fn root_must_be_in_theme_namespace() {
        let xml = r#"<ThemeSyntaxDefinition name="Dark"></ThemeSyntaxDefinition>"#;
        assert!(ThemeDocumentParser::parse_str(xml, false).is_err());
    }

    #[test]
    fn malformed_markup_is_a_format_error() {
        let xml = themed(r#"<SyntaxDefinition name="C#"></Color>"#);
        assert!(ThemeDocumentParser::parse_str(&xml, false).is_err());
    }
}
