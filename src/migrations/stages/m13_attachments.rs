//! Attachments: metadata rows in Redmine, payloads in the files directory.

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use sha2::{Digest, Sha256};

use crate::context::Context;
use crate::error::AppError;
use crate::migrations::stages::clear_tables;
use crate::migrations::{Migration, StageReport};
use crate::models::disk_filename;
use crate::sql;

pub struct M13Attachments;

impl Migration for M13Attachments {
    fn id(&self) -> &'static str {
        "m13_attachments"
    }

    fn order(&self) -> u32 {
        13
    }

    fn description(&self) -> &'static str {
        "Attachments and their payloads"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            let target = &*ctx.target;
            clear_tables(target, &["attachments"]).await?;

            let mut rows = sql!(
                ctx.source,
                "SELECT a.attach_id, a.bug_id, a.filename, a.mimetype, a.submitter_id, \
                 a.creation_ts, a.description, ad.thedata \
                 FROM attachments a JOIN attach_data ad ON ad.id = a.attach_id \
                 ORDER BY a.attach_id"
            )
            .execute()
            .await?;

            let mut count = 0;
            while let Some(row) = rows.next().await {
                let row = row?;
                let attach_id: i64 = row.get("attach_id")?;
                let filename: String = row.get("filename")?;
                let payload: Bytes = row.get_opt("thedata")?.unwrap_or_default();
                let disk_name = disk_filename(attach_id, &filename);

                sql!(
                    target,
                    "INSERT INTO attachments (id, container_id, container_type, filename, filesize, \
                     disk_filename, content_type, digest, downloads, author_id, created_on, description) \
                     VALUES ($1, $2, 'Issue', $3, $4, $5, $6, $7, 0, $8, $9, $10)",
                    attach_id,
                    row.get::<i64>("bug_id")?,
                    &filename,
                    payload.len() as i64,
                    &disk_name,
                    row.get_raw("mimetype"),
                    hex::encode(Sha256::digest(&payload)),
                    row.get::<i64>("submitter_id")?,
                    row.get_raw("creation_ts"),
                    row.get_raw("description"),
                )
                .run()
                .await?;

                ctx.blobs.persist(&disk_name, &payload).await?;
                count += 1;
            }

            Ok(StageReport::records(count))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Row, Value};
    use crate::testing::{FakeStore, TestRig};

    fn attachment(id: i64, filename: &str, data: &'static [u8]) -> Row {
        Row::from_pairs([
            ("attach_id", Value::Int(id)),
            ("bug_id", Value::Int(7)),
            ("filename", filename.into()),
            ("mimetype", "image/png".into()),
            ("submitter_id", Value::Int(21)),
            ("creation_ts", Value::Null),
            ("description", "screenshot".into()),
            ("thedata", Value::Bytes(Bytes::from_static(data))),
        ])
    }

    #[tokio::test]
    async fn test_payloads_are_persisted_under_disk_names() {
        let source = FakeStore::source().respond(
            "FROM attachments a",
            vec![attachment(3, "Screen.PNG", b"png-bytes"), attachment(4, "README", b"")],
        );
        let rig = TestRig::new(source, FakeStore::target());

        let report = M13Attachments.up(&rig.ctx).await.unwrap();
        assert_eq!(report.records, 2);

        let files = rig.blobs.files();
        assert_eq!(files.get("a3.png").map(Vec::as_slice), Some(&b"png-bytes"[..]));
        assert_eq!(files.get("a4.dat").map(Vec::as_slice), Some(&b""[..]));

        let rows = rig.target.statements_matching("INSERT INTO attachments");
        assert_eq!(rows[0][3], Value::Int(9));
        assert_eq!(rows[0][4], Value::Text("a3.png".into()));
        assert_eq!(
            rows[1][6],
            Value::Text("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855".into())
        );
    }
}
