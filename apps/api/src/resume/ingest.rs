//! Resume upload plumbing: object storage, text extraction and the `resumes` row.

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::resume::ResumeRow;

pub fn s3_key(resume_id: Uuid, filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("resume");
    format!("resumes/{resume_id}/{name}")
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn is_pdf(filename: &str, bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF") || filename.to_lowercase().ends_with(".pdf")
}

/// Extracts plain text. PDFs are parsed on a blocking thread; anything else
/// is decoded as UTF-8, replacing invalid sequences.
pub async fn extract_text(filename: &str, bytes: Bytes) -> Result<String> {
    if !is_pdf(filename, &bytes) {
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .context("PDF extraction task failed")?
        .map_err(|e| anyhow::anyhow!("PDF extraction failed: {e}"))?;

    if text.trim().is_empty() {
        warn!("PDF {filename} produced no extractable text");
    }
    Ok(text)
}

pub async fn upload(s3: &S3Client, bucket: &str, key: &str, bytes: Bytes) -> Result<()> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(bytes))
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;
    info!("Uploaded resume to s3://{bucket}/{key}");
    Ok(())
}

pub async fn delete_object(s3: &S3Client, bucket: &str, key: &str) -> Result<()> {
    s3.delete_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("S3 delete failed: {e}"))?;
    Ok(())
}

pub async fn download(s3: &S3Client, bucket: &str, key: &str) -> Result<Bytes> {
    let object = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("S3 download failed: {e}"))?;
    let data = object
        .body
        .collect()
        .await
        .map_err(|e| anyhow::anyhow!("S3 body read failed: {e}"))?;
    Ok(data.into_bytes())
}

pub struct NewResume<'a> {
    pub id: Uuid,
    pub original_filename: &'a str,
    pub s3_key: &'a str,
    pub sha256: &'a str,
    pub char_count: usize,
    pub chunk_count: usize,
}

pub async fn insert_resume(pool: &PgPool, resume: &NewResume<'_>) -> Result<ResumeRow> {
    Ok(sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (id, original_filename, s3_key, sha256, char_count, chunk_count)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(resume.id)
    .bind(resume.original_filename)
    .bind(resume.s3_key)
    .bind(resume.sha256)
    .bind(i32::try_from(resume.char_count)?)
    .bind(i32::try_from(resume.chunk_count)?)
    .fetch_one(pool)
    .await?)
}

pub async fn get_resume(pool: &PgPool, resume_id: Uuid) -> Result<Option<ResumeRow>> {
    Ok(
        sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
            .bind(resume_id)
            .fetch_optional(pool)
            .await?,
    )
}

/// Stored chunks go with the row (`ON DELETE CASCADE`).
pub async fn delete_resume(pool: &PgPool, resume_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM resumes WHERE id = $1")
        .bind(resume_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_counts(
    pool: &PgPool,
    resume_id: Uuid,
    char_count: usize,
    chunk_count: usize,
) -> Result<()> {
    sqlx::query(
        "UPDATE resumes SET char_count = $2, chunk_count = $3, updated_at = now() WHERE id = $1",
    )
    .bind(resume_id)
    .bind(i32::try_from(char_count)?)
    .bind(i32::try_from(chunk_count)?)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_key_uses_base_name() {
        let id = Uuid::nil();
        assert_eq!(
            s3_key(id, "C:\\Users\\jane\\resume.pdf"),
            format!("resumes/{id}/resume.pdf")
        );
        assert_eq!(s3_key(id, "cv.txt"), format!("resumes/{id}/cv.txt"));
        assert_eq!(s3_key(id, ""), format!("resumes/{id}/resume"));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_plain_text_is_decoded_lossily() {
        let bytes = Bytes::from_static(b"Jane Doe\xff Rust");
        let text = extract_text("resume.txt", bytes).await.unwrap();
        assert_eq!(text, "Jane Doe\u{fffd} Rust");
    }
}
