//! Typed structured-data hashing for off-line permits.
//!
//! Follows the EIP-712 layout with one adaptation for 32-byte account ids:
//! accounts are encoded as `bytes32` instead of `address`.
//!
//! ```text
//! digest = keccak256(0x19 ‖ 0x01 ‖ domain_separator ‖ struct_hash)
//!
//! domain_separator = keccak256(DOMAIN_TYPEHASH ‖ keccak256(name)
//!                              ‖ keccak256(version) ‖ chain_id ‖ contract)
//!
//! struct_hash = keccak256(PERMIT_TYPEHASH ‖ owner ‖ spender
//!                         ‖ value ‖ nonce ‖ deadline)
//! ```
//!
//! Every field is one 32-byte word; integers are big-endian and left-padded.

use ink::env::hash::{Blake2x256, HashOutput, Keccak256};

/// A 32-byte hash or encoded word.
pub type Word = [u8; 32];

/// `keccak256("EIP712Domain(string name,string version,uint256 chainId,bytes32 verifyingContract)")`
pub const DOMAIN_TYPEHASH: Word = [
    0x0d, 0x2d, 0x13, 0x6f, 0x80, 0x44, 0x1c, 0xdf, 0x95, 0x8f, 0x57, 0xbd, 0xca, 0x1d, 0x19, 0xe4,
    0x7a, 0x85, 0x79, 0x97, 0x33, 0xf6, 0x12, 0x19, 0x32, 0x74, 0x41, 0x17, 0x79, 0xd0, 0x82, 0x00,
];

/// `keccak256("Permit(bytes32 owner,bytes32 spender,uint256 value,uint256 nonce,uint256 deadline)")`
pub const PERMIT_TYPEHASH: Word = [
    0xfb, 0x12, 0x23, 0xe5, 0xcb, 0x15, 0x75, 0xd9, 0x4e, 0x63, 0x25, 0x23, 0xd1, 0xaf, 0x07, 0xb5,
    0x48, 0xe3, 0x1a, 0x41, 0x10, 0x84, 0x62, 0x25, 0xd2, 0x1e, 0x52, 0xce, 0x55, 0x4a, 0x3d, 0x4f,
];

/// secp256k1 curve order divided by two. Signatures with a larger `s` are
/// malleable twins of a valid one and are rejected.
pub const SECP256K1_HALF_ORDER: Word = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Keccak-256 of `input`.
pub fn keccak256(input: &[u8]) -> Word {
    let mut output = <Keccak256 as HashOutput>::Type::default();
    ink::env::hash_bytes::<Keccak256>(input, &mut output);
    output
}

/// Left-pads an unsigned integer into a big-endian 32-byte word.
pub fn encode_uint(value: u128) -> Word {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn hash_words(words: &[&Word]) -> Word {
    let mut buf = ink::prelude::vec::Vec::with_capacity(words.len() * 32);
    for word in words {
        buf.extend_from_slice(&word[..]);
    }
    keccak256(&buf)
}

/// Binds signatures to one contract instance on one network.
pub fn domain_separator(name: &str, version: &str, chain_id: u64, contract: &Word) -> Word {
    hash_words(&[
        &DOMAIN_TYPEHASH,
        &keccak256(name.as_bytes()),
        &keccak256(version.as_bytes()),
        &encode_uint(u128::from(chain_id)),
        contract,
    ])
}

/// The signed allowance grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitMessage {
    pub owner: Word,
    pub spender: Word,
    pub value: u128,
    pub nonce: u64,
    pub deadline: u64,
}

impl PermitMessage {
    pub fn struct_hash(&self) -> Word {
        hash_words(&[
            &PERMIT_TYPEHASH,
            &self.owner,
            &self.spender,
            &encode_uint(self.value),
            &encode_uint(u128::from(self.nonce)),
            &encode_uint(u128::from(self.deadline)),
        ])
    }

    /// The 32-byte digest the owner signs.
    pub fn digest(&self, domain_separator: &Word) -> Word {
        let mut buf = [0u8; 66];
        buf[0] = 0x19;
        buf[1] = 0x01;
        buf[2..34].copy_from_slice(domain_separator);
        buf[34..].copy_from_slice(&self.struct_hash());
        keccak256(&buf)
    }
}

/// Packs `(v, r, s)` into the 65-byte `r ‖ s ‖ recovery_id` layout expected
/// by `ecdsa_recover`.
///
/// Returns `None` for a recovery byte other than 0/1/27/28 or a high `s`.
pub fn signature_from_parts(v: u8, r: &Word, s: &Word) -> Option<[u8; 65]> {
    let recovery_id = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => return None,
    };
    if s > &SECP256K1_HALF_ORDER {
        return None;
    }
    let mut signature = [0u8; 65];
    signature[..32].copy_from_slice(r);
    signature[32..64].copy_from_slice(s);
    signature[64] = recovery_id;
    Some(signature)
}

/// Account id controlled by a compressed ECDSA public key: the BLAKE2b-256
/// hash of its 33 bytes, as Substrate derives ECDSA account ids.
pub fn account_from_public_key(public_key: &[u8; 33]) -> Word {
    let mut output = <Blake2x256 as HashOutput>::Type::default();
    ink::env::hash_bytes::<Blake2x256>(public_key, &mut output);
    output
}
