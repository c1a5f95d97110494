//! Residue alphabets.
//!
//! Sequences enter the engine as dense residue codes, never raw characters.
//! Symbols outside an alphabet map to its wildcard (`N` for nucleotides, `X`
//! for amino acids) so every encoded code is valid for a matrix of the same
//! alphabet.

/// Nucleotide symbols in code order. `N` is the wildcard.
pub const NUCLEOTIDES: &[u8; 5] = b"ACGTN";

/// Amino-acid symbols in code order (BLOSUM row order). `X` is the wildcard.
pub const AMINO_ACIDS: &[u8; 24] = b"ARNDCQEGHILKMFPSTWYVBZX*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alphabet {
    Nucleotide,
    AminoAcid,
}

impl Alphabet {
    /// Number of distinct residue codes.
    #[inline]
    pub fn size(self) -> usize {
        match self {
            Alphabet::Nucleotide => NUCLEOTIDES.len(),
            Alphabet::AminoAcid => AMINO_ACIDS.len(),
        }
    }

    pub fn wildcard(self) -> u8 {
        match self {
            Alphabet::Nucleotide => 4,
            Alphabet::AminoAcid => 22,
        }
    }

    #[inline]
    pub fn encode_symbol(self, symbol: u8) -> u8 {
        let upper = symbol.to_ascii_uppercase();
        match self {
            Alphabet::Nucleotide => match upper {
                b'A' => 0,
                b'C' => 1,
                b'G' => 2,
                b'T' | b'U' => 3,
                _ => 4,
            },
            Alphabet::AminoAcid => AMINO_ACIDS
                .iter()
                .position(|&s| s == upper)
                .map(|p| p as u8)
                .unwrap_or(22),
        }
    }

    /// Encode raw symbols, skipping whitespace.
    pub fn encode(self, symbols: &[u8]) -> Vec<u8> {
        symbols
            .iter()
            .filter(|s| !s.is_ascii_whitespace())
            .map(|&s| self.encode_symbol(s))
            .collect()
    }

    pub fn decode_symbol(self, code: u8) -> u8 {
        let table: &[u8] = match self {
            Alphabet::Nucleotide => NUCLEOTIDES,
            Alphabet::AminoAcid => AMINO_ACIDS,
        };
        table.get(code as usize).copied().unwrap_or(b'?')
    }

    pub fn decode(self, codes: &[u8]) -> String {
        codes
            .iter()
            .map(|&c| self.decode_symbol(c) as char)
            .collect()
    }
}

/// Reverse complement of nucleotide codes. `N` maps to itself.
pub fn reverse_complement(codes: &[u8]) -> Vec<u8> {
    codes
        .iter()
        .rev()
        .map(|&c| if c < 4 { 3 - c } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nucleotide_encoding() {
        let codes = Alphabet::Nucleotide.encode(b"acgTUnx\n");
        assert_eq!(codes, vec![0, 1, 2, 3, 3, 4, 4]);
        assert_eq!(Alphabet::Nucleotide.decode(&codes[..4]), "ACGT");
    }

    #[test]
    fn test_amino_acid_wildcard() {
        let codes = Alphabet::AminoAcid.encode(b"ARJ*");
        assert_eq!(codes, vec![0, 1, 22, 23]);
        assert!(codes.iter().all(|&c| (c as usize) < Alphabet::AminoAcid.size()));
    }

    #[test]
    fn test_reverse_complement() {
        let fwd = Alphabet::Nucleotide.encode(b"AACGN");
        let rc = reverse_complement(&fwd);
        assert_eq!(Alphabet::Nucleotide.decode(&rc), "NCGTT");
        assert_eq!(reverse_complement(&rc), fwd);
    }
}
