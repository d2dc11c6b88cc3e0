mod contests;
mod leaderboard;
