//! Wire record framing for one encrypted message.
//!
//! ```text
//! nonce          : 12 bytes
//! capsule        : 32 bytes
//! ciphertext_len : 4 bytes, little-endian
//! ciphertext     : ciphertext_len bytes, tag included
//! ```

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::kem::{Sealed, AEAD_NONCE_LEN, CAPSULE_LEN};
use crate::{Error, Result};

/// Size of the cleartext record header.
pub const RECORD_HEADER_LEN: usize = AEAD_NONCE_LEN + CAPSULE_LEN + 4;

/// Serializes a sealed message as a wire record.
pub fn encode_record(sealed: &Sealed) -> Result<Vec<u8>> {
    let len = u32::try_from(sealed.ciphertext.len()).map_err(|_| {
        Error::Framing(format!(
            "ciphertext of {} bytes exceeds the record length field",
            sealed.ciphertext.len()
        ))
    })?;

    let mut out = Vec::with_capacity(RECORD_HEADER_LEN + sealed.ciphertext.len());
    out.extend_from_slice(&sealed.nonce);
    out.extend_from_slice(&sealed.capsule);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&sealed.ciphertext);
    Ok(out)
}

/// Parses one record from the front of `bytes`.
///
/// Returns the sealed message and the number of bytes consumed.
///
/// # Errors
///
/// - [`Error::Truncated`] if `bytes` ends inside the record
/// - [`Error::Framing`] if the declared length exceeds `max_ciphertext_len`
pub fn decode_record(bytes: &[u8], max_ciphertext_len: usize) -> Result<(Sealed, usize)> {
    let header = Header::parse(bytes, max_ciphertext_len)?;
    let rest = bytes.get(RECORD_HEADER_LEN..).unwrap_or_default();
    let body = rest
        .get(..header.ciphertext_len)
        .ok_or(Error::Truncated {
            field: "ciphertext",
            needed: header.ciphertext_len,
            available: rest.len(),
        })?
        .to_vec();

    let consumed = RECORD_HEADER_LEN + body.len();
    Ok((header.into_sealed(body), consumed))
}

/// Writes one record and flushes.
pub async fn write_record<W>(writer: &mut W, sealed: &Sealed) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let record = encode_record(sealed)?;
    writer.write_all(&record).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one record, waiting across partial reads until it is complete.
///
/// Returns `Ok(None)` if the stream ends cleanly on a record boundary.
/// Ending anywhere inside a record is [`Error::Truncated`]; the stream cannot be
/// resynchronized after that and should be closed.
pub async fn read_record<R>(reader: &mut R, max_ciphertext_len: usize) -> Result<Option<Sealed>>
where
    R: AsyncRead + Unpin,
{
    let mut head = [0u8; RECORD_HEADER_LEN];
    let filled = fill(reader, &mut head).await?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < RECORD_HEADER_LEN {
        return Err(Error::Truncated {
            field: "record header",
            needed: RECORD_HEADER_LEN,
            available: filled,
        });
    }

    let header = Header::parse(&head, max_ciphertext_len)?;

    let mut ciphertext = vec![0u8; header.ciphertext_len];
    let filled = fill(reader, &mut ciphertext).await?;
    if filled < ciphertext.len() {
        return Err(Error::Truncated {
            field: "ciphertext",
            needed: ciphertext.len(),
            available: filled,
        });
    }

    Ok(Some(header.into_sealed(ciphertext)))
}

struct Header {
    nonce: [u8; AEAD_NONCE_LEN],
    capsule: [u8; CAPSULE_LEN],
    ciphertext_len: usize,
}

impl Header {
    fn parse(head: &[u8], max_ciphertext_len: usize) -> Result<Self> {
        let truncated = || Error::Truncated {
            field: "record header",
            needed: RECORD_HEADER_LEN,
            available: head.len(),
        };
        let (nonce, rest) = head
            .split_first_chunk::<AEAD_NONCE_LEN>()
            .ok_or_else(truncated)?;
        let (capsule, rest) = rest.split_first_chunk::<CAPSULE_LEN>().ok_or_else(truncated)?;
        let (len, _) = rest.split_first_chunk::<4>().ok_or_else(truncated)?;

        let ciphertext_len = u32::from_le_bytes(*len) as usize;
        if ciphertext_len > max_ciphertext_len {
            return Err(Error::Framing(format!(
                "declared ciphertext length {ciphertext_len} exceeds limit {max_ciphertext_len}"
            )));
        }

        Ok(Self {
            nonce: *nonce,
            capsule: *capsule,
            ciphertext_len,
        })
    }

    fn into_sealed(self, ciphertext: Vec<u8>) -> Sealed {
        Sealed {
            ciphertext,
            capsule: self.capsule,
            nonce: self.nonce,
        }
    }
}

/// Reads until `buf` is full or the stream ends; returns the byte count.
async fn fill<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sealed(len: usize) -> Sealed {
        Sealed {
            ciphertext: (0..len).map(|i| i as u8).collect(),
            capsule: [0xcc; CAPSULE_LEN],
            nonce: [0x11; AEAD_NONCE_LEN],
        }
    }

    #[test]
    fn header_layout() {
        let record = encode_record(&sealed(3)).unwrap();

        assert_eq!(&record[..AEAD_NONCE_LEN], &[0x11; AEAD_NONCE_LEN]);
        assert_eq!(
            &record[AEAD_NONCE_LEN..AEAD_NONCE_LEN + CAPSULE_LEN],
            &[0xcc; CAPSULE_LEN]
        );
        assert_eq!(&record[RECORD_HEADER_LEN - 4..RECORD_HEADER_LEN], &[3, 0, 0, 0]);
        assert_eq!(&record[RECORD_HEADER_LEN..], &[0, 1, 2]);
    }

    #[test]
    fn decode_reports_consumed_length() {
        let mut bytes = encode_record(&sealed(5)).unwrap();
        bytes.extend_from_slice(b"next record");

        let (decoded, used) = decode_record(&bytes, 1024).unwrap();
        assert_eq!(decoded, sealed(5));
        assert_eq!(used, RECORD_HEADER_LEN + 5);
    }

    #[test]
    fn decode_rejects_oversized_length() {
        let bytes = encode_record(&sealed(64)).unwrap();
        assert!(matches!(decode_record(&bytes, 63), Err(Error::Framing(_))));
    }

    #[test]
    fn decode_rejects_truncation() {
        let bytes = encode_record(&sealed(8)).unwrap();

        assert!(matches!(
            decode_record(&bytes[..10], 1024),
            Err(Error::Truncated { field: "record header", .. })
        ));
        assert!(matches!(
            decode_record(&bytes[..bytes.len() - 1], 1024),
            Err(Error::Truncated { field: "ciphertext", needed: 8, available: 7 })
        ));
    }

    #[test]
    fn every_short_header_is_truncation() {
        let bytes = encode_record(&sealed(4)).unwrap();

        for len in 0..RECORD_HEADER_LEN {
            assert!(
                matches!(
                    decode_record(&bytes[..len], 1024),
                    Err(Error::Truncated { field: "record header", available, .. }) if available == len
                ),
                "header cut at {len} bytes"
            );
        }
    }

    #[tokio::test]
    async fn stream_read_survives_fragmented_delivery() {
        let bytes = encode_record(&sealed(40)).unwrap();
        let (mut client, mut server) = tokio::io::duplex(7);

        let writer = tokio::spawn(async move {
            for piece in bytes.chunks(3) {
                client.write_all(piece).await.unwrap();
            }
        });

        let record = read_record(&mut server, 1024).await.unwrap();
        writer.await.unwrap();
        assert_eq!(record, Some(sealed(40)));
    }

    #[tokio::test]
    async fn clean_eof_yields_none() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);

        assert!(read_record(&mut server, 1024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn eof_inside_record_is_truncation() {
        let bytes = encode_record(&sealed(16)).unwrap();
        let (mut client, mut server) = tokio::io::duplex(1024);
        client.write_all(&bytes[..bytes.len() - 4]).await.unwrap();
        drop(client);

        assert!(matches!(
            read_record(&mut server, 1024).await,
            Err(Error::Truncated { field: "ciphertext", .. })
        ));
    }
}
