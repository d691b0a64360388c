//! Numbered text menu over the report queries.
//!
//! Reads choices line by line until `0` or end of input. A failing query prints
//! its error and the menu comes back.

use std::fmt::Display;

use sqlx::AnyPool;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::AppError;
use crate::models::report::{
    EmployerVacancyCount, SalaryAverages, VacancyAboveAverage, VacancyListing, VacancyMatch,
};

const MENU: &str = "\
Choose a report:
1. Employers and their open vacancy counts
2. All vacancies
3. Average salary
4. Vacancies paying above average
5. Search vacancies by keyword
0. Exit
> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    EmployerCounts,
    AllVacancies,
    AverageSalary,
    AboveAverage,
    Search,
    Exit,
}

impl Choice {
    fn parse(input: &str) -> Result<Choice, AppError> {
        match input.trim() {
            "1" => Ok(Choice::EmployerCounts),
            "2" => Ok(Choice::AllVacancies),
            "3" => Ok(Choice::AverageSalary),
            "4" => Ok(Choice::AboveAverage),
            "5" => Ok(Choice::Search),
            "0" => Ok(Choice::Exit),
            other => Err(AppError::BadRequest(format!("Unknown option '{other}'"))),
        }
    }
}

pub async fn run<R, W>(pool: &AnyPool, mut input: R, mut output: W) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        write(&mut output, MENU).await?;
        let Some(line) = read_line(&mut input).await? else {
            break;
        };

        let choice = match Choice::parse(&line) {
            Ok(choice) => choice,
            Err(e) => {
                write(&mut output, &format!("{e}\n\n")).await?;
                continue;
            }
        };

        let rendered = match choice {
            Choice::EmployerCounts => EmployerVacancyCount::list(pool).await.map(render_rows),
            Choice::AllVacancies => VacancyListing::list(pool).await.map(render_rows),
            Choice::AverageSalary => SalaryAverages::compute(pool).await.map(|avg| match avg {
                Some(avg) => format!("{avg}\n"),
                None => "No salary data\n".to_string(),
            }),
            Choice::AboveAverage => VacancyAboveAverage::list(pool).await.map(render_rows),
            Choice::Search => {
                write(&mut output, "Keyword: ").await?;
                let Some(keyword) = read_line(&mut input).await? else {
                    break;
                };
                VacancyMatch::search(pool, &keyword).await.map(render_rows)
            }
            Choice::Exit => break,
        };

        match rendered {
            Ok(text) => write(&mut output, &format!("{text}\n")).await?,
            Err(e) => {
                tracing::error!("Report query failed: {e}");
                write(&mut output, &format!("Error: {e}\n\n")).await?;
            }
        }
    }

    output.flush().await.map_err(io_error)?;
    Ok(())
}

fn render_rows<T: Display>(rows: Vec<T>) -> String {
    if rows.is_empty() {
        return "Nothing found\n".to_string();
    }
    let mut text = String::new();
    for (i, row) in rows.iter().enumerate() {
        text.push_str(&format!("{}. {row}\n", i + 1));
    }
    text
}

async fn read_line<R: AsyncBufRead + Unpin>(input: &mut R) -> Result<Option<String>, AppError> {
    let mut line = String::new();
    let n = input.read_line(&mut line).await.map_err(io_error)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

async fn write<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<(), AppError> {
    output.write_all(text.as_bytes()).await.map_err(io_error)?;
    output.flush().await.map_err(io_error)
}

fn io_error(e: std::io::Error) -> AppError {
    AppError::Internal(format!("Terminal I/O failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::vacancy::Vacancy;
    use crate::models::vacancy::tests::{seed_employer, vacancy};

    async fn session(pool: &AnyPool, script: &str) -> String {
        let mut output = Vec::new();
        run(pool, script.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn search_finds_vacancy_case_insensitively() {
        let pool = test_pool().await;
        seed_employer(&pool).await;
        Vacancy::upsert(&pool, &vacancy("1", "Python Developer", 100, 200))
            .await
            .unwrap();

        let out = session(&pool, "5\npython\n0\n").await;

        assert!(out.contains("Keyword: "));
        assert!(out.contains("1. [1] Python Developer | from 100 to 200"));
    }

    #[tokio::test]
    async fn unknown_option_reprints_menu_and_eof_exits() {
        let pool = test_pool().await;

        let out = session(&pool, "9\n").await;

        assert!(out.contains("Bad request: Unknown option '9'"));
        assert_eq!(out.matches("Choose a report:").count(), 2);
    }

    #[tokio::test]
    async fn reports_on_empty_store() {
        let pool = test_pool().await;

        let out = session(&pool, "1\n3\n4\n0\n").await;

        assert!(out.contains("Nothing found"));
        assert!(out.contains("No salary data"));
    }

    #[tokio::test]
    async fn query_errors_return_to_the_menu() {
        let pool = test_pool().await;

        let out = session(&pool, "5\n   \n2\n0\n").await;

        assert!(out.contains("Error: Bad request: Keyword must not be empty"));
        assert!(out.contains("Nothing found"));
    }

    #[test]
    fn choices_parse_with_whitespace() {
        assert_eq!(Choice::parse(" 3 ").unwrap(), Choice::AverageSalary);
        assert!(Choice::parse("six").is_err());
    }
}
