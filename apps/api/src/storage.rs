use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// Object key for a resume's compiled PDF. One object per resume, overwritten on re-export.
pub fn resume_pdf_key(user_id: Uuid, resume_id: Uuid) -> String {
    format!("resumes/{user_id}/{resume_id}.pdf")
}

pub async fn upload_pdf(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    pdf: Bytes,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .content_type("application/pdf")
        .body(ByteStream::from(pdf))
        .send()
        .await
        .map_err(|e| AppError::S3(e.to_string()))?;

    info!("Uploaded PDF to s3://{}/{}", bucket, key);
    Ok(())
}

pub async fn delete_object(s3: &aws_sdk_s3::Client, bucket: &str, key: &str) -> Result<(), AppError> {
    s3.delete_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::S3(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_pdf_key_layout() {
        let user = Uuid::nil();
        let resume = Uuid::from_u128(1);
        assert_eq!(
            resume_pdf_key(user, resume),
            format!("resumes/{user}/{resume}.pdf")
        );
    }
}
