// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rule-file parser using nom
//!
//! Reads the textual rule grammar into [`RuleDescription`] records.
//! Indices in the text are 1-based and converted to 0-based here.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while1},
    character::complete::{char, digit1, multispace1, one_of},
    combinator::{map, map_res, opt, recognize},
    error::ErrorKind,
    multi::{many0, many1, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::{Error, Result};
use crate::rule::{
    AffinePoint, Coefficient, Coordinates, ElementPoints, OldEntity, OldPoint,
    RuleDescription, RuleFile, Tolerance,
};

/// An item inside a `{ ... }` block.
#[derive(Debug, Clone, Copy, PartialEq)]
enum BlockItem {
    /// Plain number, used by tolerance blocks.
    Number(f64),
    /// `0.5 X2`, with the 1-based point index as written.
    Term { weight: f64, axis: usize, point: usize },
}

/// A point entry before its blocks are interpreted.
#[derive(Debug, Clone, PartialEq)]
struct RawPoint {
    coords: Coordinates,
    blocks: Vec<Vec<BlockItem>>,
}

/// Skip a `#` comment up to the end of the line
fn comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(char('#'), take_till(|c| c == '\n')))(input)
}

/// Skip whitespace and comments
fn ws(input: &str) -> IResult<&str, ()> {
    map(many0(alt((multispace1, comment))), |_| ())(input)
}

/// Comma with optional surrounding whitespace
fn comma(input: &str) -> IResult<&str, char> {
    delimited(ws, char(','), ws)(input)
}

/// Parse float: 1, -0.5, .5, 1., 1.5e-3
fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            alt((
                recognize(pair(digit1, opt(pair(char('.'), opt(digit1))))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

/// Parse an unsigned index as written in the file
fn index(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>())(input)
}

/// Parse a double-quoted rule name
fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_till(|c| c == '"'), char('"'))(input)
}

/// Parse a section keyword
fn keyword(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

/// Parse coordinates: (0.5, 0.866) or (0, 0, 1)
fn coordinates(input: &str) -> IResult<&str, Coordinates> {
    map(
        delimited(
            pair(char('('), ws),
            separated_list1(comma, number),
            pair(ws, char(')')),
        ),
        Coordinates::from_vec,
    )(input)
}

/// Parse an index tuple: (1, 2, 3)
fn index_tuple(input: &str) -> IResult<&str, Vec<usize>> {
    delimited(
        pair(char('('), ws),
        separated_list1(comma, index),
        pair(ws, char(')')),
    )(input)
}

/// Parse a coefficient term: 0.5 X2, Y3, -1 Z4
fn term(input: &str) -> IResult<&str, BlockItem> {
    map(
        tuple((opt(terminated(number, ws)), one_of("XYZxyz"), index)),
        |(weight, axis, point)| BlockItem::Term {
            weight: weight.unwrap_or(1.0),
            axis: match axis {
                'X' | 'x' => 0,
                'Y' | 'y' => 1,
                _ => 2,
            },
            point,
        },
    )(input)
}

/// Parse a brace block: { 0.5 X2, 1 Y3 } or { 1.0, 0, 1.0 } or { }
fn block(input: &str) -> IResult<&str, Vec<BlockItem>> {
    delimited(
        pair(char('{'), ws),
        separated_list0(comma, alt((term, map(number, BlockItem::Number)))),
        pair(ws, char('}')),
    )(input)
}

/// Parse a point entry: (x, y) {..} {..};
fn point_entry(input: &str) -> IResult<&str, RawPoint> {
    map(
        tuple((coordinates, many0(preceded(ws, block)), ws, char(';'))),
        |(coords, blocks, _, _)| RawPoint { coords, blocks },
    )(input)
}

/// Parse an entity entry: (1, 2) del;
fn entity_entry(input: &str) -> IResult<&str, (Vec<usize>, bool)> {
    map(
        tuple((index_tuple, opt(preceded(ws, tag("del"))), ws, char(';'))),
        |(indices, del, _, _)| (indices, del.is_some()),
    )(input)
}

/// Parse an index entry without flags: (1, 2, 3);
fn plain_entry(input: &str) -> IResult<&str, Vec<usize>> {
    terminated(index_tuple, pair(ws, char(';')))(input)
}

/// Parse the library header: tolfak 0.5
fn tolfak(input: &str) -> IResult<&str, f64> {
    preceded(pair(tag("tolfak"), ws), number)(input)
}

/// Collects the sections of one rule until `endrule`.
#[derive(Debug, Default)]
struct RuleBuilder {
    name: String,
    quality: usize,
    /// Dimension implied by `maplines`/`mapfaces` style keywords.
    keyword_dims: Vec<usize>,
    old_points: Vec<RawPoint>,
    old_entities: Vec<(Vec<usize>, bool)>,
    new_points: Vec<RawPoint>,
    new_entities: Vec<Vec<usize>>,
    free_zone: Vec<RawPoint>,
    free_sets: Vec<Vec<usize>>,
    elements: Vec<Vec<usize>>,
    orientations: Vec<Vec<usize>>,
}

/// Parse one rule block
fn rule(input: &str) -> IResult<&str, RuleBuilder> {
    let (mut rest, name) = preceded(pair(tag("rule"), ws), quoted)(input)?;
    let mut builder = RuleBuilder {
        name: name.to_string(),
        quality: 1,
        ..RuleBuilder::default()
    };

    loop {
        let (at, _) = ws(rest)?;
        let (r, word) = keyword(at)?;
        rest = match word {
            "endrule" => return Ok((r, builder)),
            "quality" => {
                let (r, q) = preceded(ws, index)(r)?;
                builder.quality = q;
                r
            }
            "mappoints" => {
                let (r, points) = many0(preceded(ws, point_entry))(r)?;
                builder.old_points.extend(points);
                r
            }
            "maplines" | "mapfaces" => {
                builder.keyword_dims.push(if word == "maplines" { 2 } else { 3 });
                let (r, entities) = many0(preceded(ws, entity_entry))(r)?;
                builder.old_entities.extend(entities);
                r
            }
            "newpoints" => {
                let (r, points) = many0(preceded(ws, point_entry))(r)?;
                builder.new_points.extend(points);
                r
            }
            "newlines" | "newfaces" => {
                builder.keyword_dims.push(if word == "newlines" { 2 } else { 3 });
                let (r, entities) = many0(preceded(ws, plain_entry))(r)?;
                builder.new_entities.extend(entities);
                r
            }
            "freearea" | "freezone" => {
                builder.keyword_dims.push(if word == "freearea" { 2 } else { 3 });
                let (r, points) = many0(preceded(ws, point_entry))(r)?;
                builder.free_zone.extend(points);
                r
            }
            "freeset" => {
                let (r, set) = terminated(many1(preceded(ws, index)), pair(ws, char(';')))(r)?;
                builder.free_sets.push(set);
                r
            }
            "elements" => {
                let (r, elements) = many0(preceded(ws, plain_entry))(r)?;
                builder.elements.extend(elements);
                r
            }
            "orientations" => {
                builder.keyword_dims.push(3);
                let (r, tets) = many0(preceded(ws, plain_entry))(r)?;
                builder.orientations.extend(tets);
                r
            }
            _ => {
                return Err(nom::Err::Failure(nom::error::Error::new(
                    at,
                    ErrorKind::Tag,
                )))
            }
        };
    }
}

impl RuleBuilder {
    /// Interprets blocks, converts indices to 0-based and validates.
    fn finish(self) -> Result<RuleDescription> {
        let name = self.name.clone();

        let dimension = match self.old_points.first() {
            Some(p) => p.coords.len(),
            None => return Err(Error::invalid(&name, "rule has no map points")),
        };
        let arities_agree = self
            .old_points
            .iter()
            .chain(&self.new_points)
            .chain(&self.free_zone)
            .all(|p| p.coords.len() == dimension);
        if !arities_agree || self.keyword_dims.iter().any(|&d| d != dimension) {
            return Err(Error::MixedDimensions(name));
        }

        let mut desc = RuleDescription::new(name.clone(), dimension);
        desc.quality = u32::try_from(self.quality)
            .map_err(|_| Error::invalid(&name, "quality out of range"))?;

        for raw in self.old_points {
            let tolerance = tolerance_from_blocks(&name, &raw.blocks)?;
            desc.old_points.push(OldPoint {
                position: raw.coords,
                tolerance,
            });
        }
        for (indices, delete) in self.old_entities {
            desc.old_entities.push(OldEntity {
                points: zero_based(&name, &indices)?,
                delete,
            });
        }
        for raw in self.new_points {
            desc.new_points.push(affine_from_raw(&name, raw, dimension)?);
        }
        for indices in self.new_entities {
            desc.new_entities.push(zero_based(&name, &indices)?);
        }
        for raw in self.free_zone {
            desc.free_zone.push(affine_from_raw(&name, raw, dimension)?);
        }
        for set in self.free_sets {
            desc.free_sets.push(zero_based::<Vec<usize>>(&name, &set)?);
        }
        for indices in self.elements {
            desc.elements.push(zero_based::<ElementPoints>(&name, &indices)?);
        }
        for indices in self.orientations {
            let tet: Vec<usize> = zero_based(&name, &indices)?;
            let tet: [usize; 4] = tet
                .try_into()
                .map_err(|_| Error::invalid(&name, "orientations need four points"))?;
            desc.orientations.push(tet);
        }

        desc.validate()?;
        Ok(desc)
    }
}

/// Converts 1-based file indices to 0-based.
fn zero_based<C: FromIterator<usize>>(rule: &str, indices: &[usize]) -> Result<C> {
    indices
        .iter()
        .map(|&i| {
            i.checked_sub(1)
                .ok_or_else(|| Error::invalid(rule, "indices are 1-based"))
        })
        .collect()
}

fn tolerance_from_blocks(rule: &str, blocks: &[Vec<BlockItem>]) -> Result<Option<Tolerance>> {
    let block = match blocks {
        [] => return Ok(None),
        [block] => block,
        _ => return Err(Error::invalid(rule, "map point takes one tolerance block")),
    };
    let values: Vec<f64> = block
        .iter()
        .map(|item| match item {
            BlockItem::Number(v) => Ok(*v),
            BlockItem::Term { .. } => Err(Error::invalid(
                rule,
                "map point tolerance cannot contain coefficient terms",
            )),
        })
        .collect::<Result<_>>()?;
    match values.as_slice() {
        [] => Ok(None),
        [f] => Ok(Some(Tolerance::Isotropic(*f))),
        [f1, f2, f3] => Ok(Some(Tolerance::Quadratic([*f1, *f2, *f3]))),
        _ => Err(Error::invalid(rule, "tolerance takes 1 or 3 values")),
    }
}

fn affine_from_raw(rule: &str, raw: RawPoint, dimension: usize) -> Result<AffinePoint> {
    if raw.blocks.len() > dimension {
        return Err(Error::invalid(rule, "more coefficient blocks than coordinates"));
    }
    let mut terms = vec![Vec::new(); dimension];
    for (coord, block) in raw.blocks.iter().enumerate() {
        for item in block {
            match *item {
                BlockItem::Term {
                    weight,
                    axis,
                    point,
                } => {
                    let point = point
                        .checked_sub(1)
                        .ok_or_else(|| Error::invalid(rule, "indices are 1-based"))?;
                    terms[coord].push(Coefficient {
                        weight,
                        point,
                        axis,
                    });
                }
                BlockItem::Number(_) => {
                    return Err(Error::invalid(
                        rule,
                        "expected coefficient term such as 0.5 X2",
                    ))
                }
            }
        }
    }
    Ok(AffinePoint {
        position: raw.coords,
        terms,
    })
}

/// 1-based line of `remaining` inside `source`.
fn line_of(source: &str, remaining: &str) -> usize {
    let offset = source.len().saturating_sub(remaining.len());
    source[..offset].matches('\n').count() + 1
}

fn to_parse_error(source: &str, err: nom::Err<nom::error::Error<&str>>) -> Error {
    match err {
        nom::Err::Incomplete(_) => Error::parse(line_of(source, ""), "unexpected end of input"),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let near: String = e.input.lines().next().unwrap_or("").chars().take(32).collect();
            Error::parse(
                line_of(source, e.input),
                format!("unexpected input near {:?} ({:?})", near, e.code),
            )
        }
    }
}

/// Parse a complete rule file.
///
/// Example:
/// ```
/// use frontmesh_core::parse_rules;
///
/// let text = r#"
/// rule "Close Triangle"
/// quality 1
/// mappoints (0, 0); (1, 0); (0.5, 0.866) { 0.5 };
/// maplines (1, 2) del; (2, 3) del; (3, 1) del;
/// freearea (0, 0); (1, 0); (0.5, 0.866) { 1 X3 } { 1 Y3 };
/// elements (1, 2, 3);
/// endrule
/// "#;
/// let file = parse_rules(text).unwrap();
/// assert_eq!(file.rules.len(), 1);
/// assert_eq!(file.rules[0].dimension, 2);
/// ```
pub fn parse_rules(input: &str) -> Result<RuleFile> {
    let mut file = RuleFile::default();
    let mut rest = input;

    loop {
        rest = ws(rest).map(|(r, _)| r).unwrap_or(rest);
        if rest.is_empty() {
            break;
        }
        if let Ok((r, factor)) = tolfak(rest) {
            file.tolerance_factor = Some(factor);
            rest = r;
            continue;
        }
        let (r, builder) = rule(rest).map_err(|e| to_parse_error(input, e))?;
        file.rules.push(builder.finish()?);
        rest = r;
    }

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number() {
        assert_eq!(number("3.14"), Ok(("", 3.14)));
        assert_eq!(number("-0.5"), Ok(("", -0.5)));
        assert_eq!(number("1."), Ok(("", 1.0)));
        assert_eq!(number(".25"), Ok(("", 0.25)));
        assert_eq!(number("1.5e-3"), Ok(("", 1.5e-3)));
        assert_eq!(number("7"), Ok(("", 7.0)));
    }

    #[test]
    fn test_ws_skips_comments() {
        assert_eq!(ws("  # note\n  rule"), Ok(("rule", ())));
        assert_eq!(ws(""), Ok(("", ())));
    }

    #[test]
    fn test_term() {
        assert_eq!(
            term("0.5 X2"),
            Ok((
                "",
                BlockItem::Term {
                    weight: 0.5,
                    axis: 0,
                    point: 2
                }
            ))
        );
        assert_eq!(
            term("Z4"),
            Ok((
                "",
                BlockItem::Term {
                    weight: 1.0,
                    axis: 2,
                    point: 4
                }
            ))
        );
    }

    #[test]
    fn test_block_variants() {
        let (_, items) = block("{ 1.0, 0, 1.0 }").unwrap();
        assert_eq!(
            items,
            vec![
                BlockItem::Number(1.0),
                BlockItem::Number(0.0),
                BlockItem::Number(1.0)
            ]
        );
        let (_, items) = block("{ }").unwrap();
        assert!(items.is_empty());
        let (_, items) = block("{ 0.5 X2, -1 Y3 }").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_point_entry() {
        let (rest, p) = point_entry("(0.5, 0.866) { 0.5 X2 } { };").unwrap();
        assert_eq!(rest, "");
        assert_eq!(p.coords.as_slice(), &[0.5, 0.866]);
        assert_eq!(p.blocks.len(), 2);
    }

    #[test]
    fn test_entity_entry() {
        assert_eq!(entity_entry("(1, 2) del;"), Ok(("", (vec![1, 2], true))));
        assert_eq!(entity_entry("(3,1);"), Ok(("", (vec![3, 1], false))));
    }

    const FREE_TRIANGLE: &str = r#"
tolfak 0.5

# Base line plus one new point.
rule "Free Triangle"

quality 1

mappoints
(0, 0);
(1, 0) { 1.0, 0, 1.0 };

maplines
(1, 2) del;

newpoints
(0.5, 0.866) { 0.5 X2 } { };

newlines
(1, 3);
(3, 2);

freearea
(0, 0);
(1, 0) { 1 X2 } { };
(1.5, 0.7) { 0.5 X2 } { };
(0.5, 1.5) { 0.5 X2 } { };
(-0.5, 0.7) { 0.5 X2 } { };

elements
(1, 2, 3);

endrule
"#;

    #[test]
    fn test_parse_free_triangle() {
        let file = parse_rules(FREE_TRIANGLE).unwrap();
        assert_eq!(file.tolerance_factor, Some(0.5));
        assert_eq!(file.rules.len(), 1);

        let rule = &file.rules[0];
        assert_eq!(rule.name, "Free Triangle");
        assert_eq!(rule.dimension, 2);
        assert_eq!(rule.quality, 1);
        assert_eq!(rule.old_points.len(), 2);
        assert_eq!(
            rule.old_points[1].tolerance,
            Some(Tolerance::Quadratic([1.0, 0.0, 1.0]))
        );
        assert_eq!(rule.old_entities.len(), 1);
        assert!(rule.old_entities[0].delete);
        assert_eq!(rule.old_entities[0].points.as_slice(), &[0, 1]);
        assert_eq!(rule.new_points.len(), 1);
        assert_eq!(
            rule.new_points[0].terms[0],
            vec![Coefficient {
                weight: 0.5,
                point: 1,
                axis: 0
            }]
        );
        assert!(rule.new_points[0].terms[1].is_empty());
        assert_eq!(rule.new_entities.len(), 2);
        assert_eq!(rule.new_entities[1].as_slice(), &[2, 1]);
        assert_eq!(rule.free_zone.len(), 5);
        assert_eq!(rule.elements[0].as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_parse_volume_rule() {
        let text = r#"
rule "Close Tetrahedron"
quality 1
mappoints
(0, 0, 0);
(1, 0, 0);
(0.5, 0.866, 0);
(0.5, 0.288, 0.816) { 0.5 };
mapfaces
(1, 2, 3) del;
(1, 4, 2) del;
(2, 4, 3) del;
(3, 4, 1) del;
freezone
(0, 0, 0);
(1, 0, 0);
(0.5, 0.866, 0);
(0.5, 0.288, 0.816) { 1 X4 } { 1 Y4 } { 1 Z4 };
freeset 1 2 3 4;
elements
(1, 2, 3, 4);
orientations
(1, 2, 3, 4);
endrule
"#;
        let file = parse_rules(text).unwrap();
        let rule = &file.rules[0];
        assert_eq!(rule.dimension, 3);
        assert_eq!(rule.old_entities.len(), 4);
        assert_eq!(rule.free_sets, vec![vec![0, 1, 2, 3]]);
        assert_eq!(rule.free_zone[3].terms[2][0].axis, 2);
        assert_eq!(rule.orientations, vec![[0, 1, 2, 3]]);
        assert_eq!(rule.old_points[3].tolerance, Some(Tolerance::Isotropic(0.5)));
    }

    #[test]
    fn test_unknown_section_reports_line() {
        let text = "rule \"bad\"\nquality 1\nbogus\nendrule\n";
        match parse_rules(text) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let text = r#"
rule "mixed"
mappoints (0, 0); (1, 0);
mapfaces (1, 2, 1) del;
freearea (0, 0); (1, 0); (0, 1);
endrule
"#;
        assert!(matches!(parse_rules(text), Err(Error::MixedDimensions(_))));
    }

    #[test]
    fn test_zero_index_rejected() {
        let text = r#"
rule "zero"
mappoints (0, 0); (1, 0);
maplines (0, 1) del;
freearea (0, 0); (1, 0); (0, 1);
endrule
"#;
        assert!(matches!(parse_rules(text), Err(Error::InvalidRule { .. })));
    }
}
