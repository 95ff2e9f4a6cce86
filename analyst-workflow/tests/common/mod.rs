#![allow(dead_code)]

use analyst_core::Dataset;
use analyst_workflow::acquisition::parsers;

pub const FILMS_PATH: &str = "/wiki/List_of_highest-grossing_films";

pub const COURT_DATASET: &str = "indian high court judgement dataset";

pub const FILMS_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>List of highest-grossing films</title></head>
<body>
<table class="infobox"><tr><td>Navigation</td></tr></table>
<table class="wikitable sortable plainrowheaders">
<caption>Highest-grossing films</caption>
<tbody>
<tr><th scope="col">Rank</th><th scope="col">Peak</th><th scope="col">Title</th><th scope="col">Worldwide gross</th><th scope="col">Year</th><th scope="col">Ref</th></tr>
<tr><td>1</td><td>1</td><th scope="row"><i><a href="/wiki/Avatar_(2009_film)">Avatar</a></i></th><td>$2,923,706,026</td><td>2009</td><td><sup class="reference">[# 1]</sup></td></tr>
<tr><td>2</td><td>1</td><th scope="row"><i><a href="/wiki/Avengers:_Endgame">Avengers: Endgame</a></i></th><td>$2,797,501,328</td><td>2019</td><td><sup>[# 2]</sup></td></tr>
<tr><td>3</td><td>1</td><th scope="row"><i>Avatar: The Way of Water</i></th><td>$2,320,250,281</td><td>2022</td><td></td></tr>
<tr><td>4</td><td>1</td><th scope="row"><i><a href="/wiki/Titanic_(1997_film)">Titanic</a></i></th><td><span style="display:none">7000</span>T$2,257,844,554</td><td>1997</td><td></td></tr>
<tr><td>5</td><td>5</td><th scope="row"><i>Star Wars: The Force Awakens</i></th><td>$2,071,310,218</td><td>2015</td><td></td></tr>
<tr><td>6</td><td>4</td><th scope="row"><i>Avengers: Infinity War</i></th><td>$2,052,415,039</td><td>2018</td><td></td></tr>
<tr><td>7</td><td>7<sup>[# 3]</sup></td><th scope="row"><i>Spider-Man: No Way Home</i></th><td>$1,921,847,111</td><td>2021</td><td></td></tr>
<tr><td>8</td><td>3</td><th scope="row"><i>Jurassic World</i></th><td>$1,671,537,444</td><td>2015</td><td></td></tr>
<tr><td>9</td><td>8</td><th scope="row"><i>The Lion King</i></th><td>$1,656,943,394</td><td>2019</td><td></td></tr>
<tr><td>10</td><td>7</td><th scope="row"><i>Furious 7</i></th><td>$1,515,341,399</td><td>2015</td><td></td></tr>
</tbody>
</table>
</body></html>
"#;

pub fn films_task(base_url: &str) -> String {
    format!(
        r#"Scrape the list of highest grossing films from Wikipedia. It is at the URL:
{base_url}{FILMS_PATH}

Answer the following questions and respond with a JSON array of strings containing the answer.

1. How many $2 bn movies were released before 2020?
2. Which is the earliest film that grossed over $1.5 bn?
3. What's the correlation between the Rank and Peak?
4. Draw a scatterplot of Rank and Peak along with a dotted red regression line through it.
   Return as a base-64 encoded data URI, `"data:image/png;base64,iVBORw0KG..."` under 100,000 bytes.
"#
    )
}

pub const COURT_JSON: &str = r#"[
  {"court": "33_10", "date_of_registration": "04-01-2019", "decision_date": "2019-02-23", "disposal_nature": "DISMISSED", "year": 2019},
  {"court": "27_1", "date_of_registration": "12-02-2018", "decision_date": "2018-05-01", "disposal_nature": "ALLOWED", "year": 2018},
  {"court": "33_10", "date_of_registration": "11-03-2019", "decision_date": "2019-05-10", "disposal_nature": "ALLOWED", "year": 2019},
  {"court": "9_13", "date_of_registration": "02-05-2020", "decision_date": "2020-07-14", "disposal_nature": "DISMISSED", "year": 2020},
  {"court": "27_1", "date_of_registration": "19-08-2019", "decision_date": "2019-12-02", "disposal_nature": "DISPOSED OFF", "year": 2019},
  {"court": "33_10", "date_of_registration": "15-06-2020", "decision_date": "2020-09-03", "disposal_nature": "DISMISSED", "year": 2020},
  {"court": "27_1", "date_of_registration": "01-03-2017", "decision_date": "2017-04-11", "disposal_nature": "ALLOWED", "year": 2017},
  {"court": "33_10", "date_of_registration": "20-01-2021", "decision_date": "2021-04-25", "disposal_nature": "WITHDRAWN", "year": 2021},
  {"court": "9_13", "date_of_registration": "13-09-2021", "decision_date": "2021-10-30", "disposal_nature": "ALLOWED", "year": 2021},
  {"court": "27_1", "date_of_registration": "05-05-2023", "decision_date": "2023-06-01", "disposal_nature": "DISMISSED", "year": 2023},
  {"court": "33_10", "date_of_registration": "07-02-2022", "decision_date": "2022-06-07", "disposal_nature": "DISMISSED", "year": 2022},
  {"court": "27_1", "date_of_registration": "22-11-2022", "decision_date": "2023-01-09", "disposal_nature": "ALLOWED", "year": 2022}
]"#;

pub const COURT_Q1: &str = "Which high court disposed the most cases from 2019 - 2022?";
pub const COURT_Q2: &str =
    "What's the regression slope of the date_of_registration - decision_date by year in the court=33_10?";
pub const COURT_Q3: &str = "Plot the year and # of days of delay from the above question as a scatterplot with a regression line. Encode as a base64 data URI under 100,000 characters";

pub fn court_task() -> String {
    format!(
        r#"The Indian high court judgement dataset contains judgements from the Indian High Courts, downloaded from the ecourts website.

Answer the following questions and respond with a JSON object containing the answer.

```json
{{
  "{COURT_Q1}": "...",
  "{COURT_Q2}": "...",
  "{COURT_Q3}": "data:image/webp:base64,..."
}}
```
"#
    )
}

pub fn films_dataset() -> Dataset {
    parsers::parse_dataset("films", parsers::ContentKind::Html, FILMS_HTML).unwrap()
}

pub fn court_dataset() -> Dataset {
    parsers::parse_dataset(COURT_DATASET, parsers::ContentKind::Json, COURT_JSON).unwrap()
}
