//! Binary encoding for Hack instructions
//!
//! The dest/comp/jump mnemonic sets are closed, so they live in `phf` maps
//! built at compile time. A lookup miss means the mnemonic does not exist
//! in the instruction set; callers turn that into an encoding error rather
//! than guessing a default.

use phf::phf_map;

/// Destination mnemonic to binary code mapping (3 bits)
///
/// Bit order is A, D, M; the empty string is the null destination.
static DEST_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    "" => "000",
    "M" => "001",
    "D" => "010",
    "MD" => "011",
    "A" => "100",
    "AM" => "101",
    "AD" => "110",
    "AMD" => "111",
};

/// Computation mnemonic to binary code mapping (7 bits: `a` + `cccccc`)
///
/// The leading bit selects the A register (0) or M (1). Commutative
/// operators are listed in both spellings; they encode identically.
static COMP_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    // a=0 (A register operations)
    "0" => "0101010",
    "1" => "0111111",
    "-1" => "0111010",
    "D" => "0001100",
    "A" => "0110000",
    "!D" => "0001101",
    "!A" => "0110001",
    "-D" => "0001111",
    "-A" => "0110011",
    "D+1" => "0011111",
    "A+1" => "0110111",
    "D-1" => "0001110",
    "A-1" => "0110010",
    "D+A" => "0000010",
    "A+D" => "0000010",
    "D-A" => "0010011",
    "A-D" => "0000111",
    "D&A" => "0000000",
    "A&D" => "0000000",
    "D|A" => "0010101",
    "A|D" => "0010101",

    // a=1 (M register operations)
    "M" => "1110000",
    "!M" => "1110001",
    "-M" => "1110011",
    "M+1" => "1110111",
    "M-1" => "1110010",
    "D+M" => "1000010",
    "M+D" => "1000010",
    "D-M" => "1010011",
    "M-D" => "1000111",
    "D&M" => "1000000",
    "M&D" => "1000000",
    "D|M" => "1010101",
    "M|D" => "1010101",
};

/// Jump mnemonic to binary code mapping (3 bits)
static JUMP_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    "" => "000",
    "JGT" => "001",
    "JEQ" => "010",
    "JGE" => "011",
    "JLT" => "100",
    "JNE" => "101",
    "JLE" => "110",
    "JMP" => "111",
};

/// Translates a destination mnemonic; `None` if it is not in the table.
#[inline]
#[must_use]
pub fn dest(mnemonic: &str) -> Option<&'static str> {
    DEST_MAP.get(mnemonic).copied()
}

/// Translates a computation mnemonic; `None` if it is not in the table.
#[inline]
#[must_use]
pub fn comp(mnemonic: &str) -> Option<&'static str> {
    COMP_MAP.get(mnemonic).copied()
}

/// Translates a jump mnemonic; `None` if it is not in the table.
#[inline]
#[must_use]
pub fn jump(mnemonic: &str) -> Option<&'static str> {
    JUMP_MAP.get(mnemonic).copied()
}

/// Encodes a complete C-instruction as `111accccccdddjjj`.
///
/// Returns `None` when any field is not a known mnemonic.
///
/// # Example
/// ```
/// use hack_assembler::code::encode_c_instruction;
/// let instruction = encode_c_instruction("D", "D+1", "").unwrap();
/// assert_eq!(instruction, "1110011111010000");
/// assert!(encode_c_instruction("D", "D+2", "").is_none());
/// ```
#[inline]
#[must_use]
pub fn encode_c_instruction(
    dest_mnemonic: &str,
    comp_mnemonic: &str,
    jump_mnemonic: &str,
) -> Option<String> {
    Some(format!(
        "111{}{}{}",
        comp(comp_mnemonic)?,
        dest(dest_mnemonic)?,
        jump(jump_mnemonic)?
    ))
}

/// Encodes an A-instruction as `0vvvvvvvvvvvvvvv` (15-bit value).
///
/// # Example
/// ```
/// use hack_assembler::code::encode_a_instruction;
/// assert_eq!(encode_a_instruction(100), "0000000001100100");
/// ```
#[inline]
#[must_use]
pub fn encode_a_instruction(address: u16) -> String {
    format!("{address:016b}")
}
