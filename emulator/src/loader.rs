//! Turn `.ls8` listings and raw binary images into program bytes.
//!
//! A listing holds one byte per line, written in binary. Anything after a `#` is a comment, and
//! blank lines are ignored:
//!
//! ```text
//! # print8.ls8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

use miette::{Diagnostic, SourceSpan};
use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0},
    combinator::{all_consuming, map_res, opt, rest},
    sequence::{delimited, preceded, terminated},
    Finish, IResult, Offset,
};
use thiserror::Error;
use tracing::debug;

use crate::constants::{Word, MEMORY_SIZE};

/// The `print8` program, loaded when no program is given
pub const DEMO_PROGRAM: &[Word] = &[
    0b1000_0010, // LDI R0,8
    0b0000_0000,
    0b0000_1000,
    0b0100_0111, // PRN R0
    0b0000_0000,
    0b0000_0001, // HLT
];

#[derive(Debug, Error, Diagnostic)]
pub enum LoaderError {
    #[error("invalid byte on line {line}")]
    #[diagnostic(help("each line holds one byte written in binary, like `10000010`"))]
    InvalidLine {
        line: usize,

        #[label("expected at most 8 binary digits, optionally followed by a # comment")]
        span: SourceSpan,
    },

    #[error("program is empty")]
    Empty,

    #[error("program of {0} bytes does not fit in memory")]
    TooLarge(usize),
}

/// Parse a binary number
fn from_binary(input: &str) -> Result<Word, std::num::ParseIntError> {
    Word::from_str_radix(input, 2)
}

/// Check if character is a binary digit
fn is_bin_digit(c: char) -> bool {
    c.is_digit(2)
}

/// Parse a single listing line, yielding the byte it holds, if any
fn parse_line(input: &str) -> IResult<&str, Option<Word>> {
    all_consuming(terminated(
        delimited(
            space0,
            opt(map_res(take_while1(is_bin_digit), from_binary)),
            space0,
        ),
        opt(preceded(char('#'), rest)),
    ))(input)
}

fn check_size(program: Vec<Word>) -> Result<Vec<Word>, LoaderError> {
    if program.is_empty() {
        return Err(LoaderError::Empty);
    }

    if program.len() > MEMORY_SIZE {
        return Err(LoaderError::TooLarge(program.len()));
    }

    Ok(program)
}

/// Parse a `.ls8` listing
///
/// # Errors
///
/// Fails on the first malformed line, or if the program is empty or too large.
pub fn parse_listing(source: &str) -> Result<Vec<Word>, LoaderError> {
    let mut program = Vec::new();

    for (number, line) in source.lines().enumerate() {
        match parse_line(line).finish() {
            Ok((_, Some(byte))) => program.push(byte),
            Ok((_, None)) => {}
            Err(_) => {
                return Err(LoaderError::InvalidLine {
                    line: number + 1,
                    span: (source.offset(line), line.len()).into(),
                })
            }
        }
    }

    debug!(len = program.len(), "Parsed listing");
    check_size(program)
}

/// Take a raw binary image as-is
///
/// # Errors
///
/// Fails if the image is empty or too large.
pub fn from_image(image: Vec<Word>) -> Result<Vec<Word>, LoaderError> {
    check_size(image)
}
