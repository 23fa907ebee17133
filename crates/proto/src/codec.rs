use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// The largest frame either side will accept.
pub const MAX_FRAME: u32 = 1 << 27;

/// Writes one value as a frame: a four-byte little-endian length header
/// followed by the self-describing JSON encoding of the value.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), crate::Error>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let body = serde_json::to_vec(value).map_err(crate::Error::Encoding)?;

    let mut buf = Vec::with_capacity(4 + body.len());
    buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
    buf.extend_from_slice(&body);

    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame and decodes its value. An EOF before the length
/// header maps to Ok(None); an EOF mid-frame or a frame larger than
/// [`MAX_FRAME`] is an error.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, crate::Error>
where
    R: AsyncRead + Unpin,
    T: serde::de::DeserializeOwned,
{
    let length = match reader.read_u32_le().await {
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
        Ok(l) if l > MAX_FRAME => return Err(crate::Error::FrameTooLarge(l)),
        Ok(l) => l,
    };

    let mut buf = vec![0; length as usize];
    reader.read_exact(&mut buf).await?;

    let value = serde_json::from_slice(&buf).map_err(crate::Error::Encoding)?;
    Ok(Some(value))
}
